// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Service modules for running loads.

pub mod loads;
pub mod streaming;
pub mod upload;

pub use loads::run_load;
pub use streaming::load_streaming;
pub use upload::{decode_upload, upload_location};
