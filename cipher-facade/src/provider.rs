// Copyright 2023 Ant Group Co., Ltd.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! One-time crypto provider registration.
//!
//! OpenSSL 3 moved DES and Blowfish into the `legacy` provider, which has to
//! be loaded next to the default one before those ciphers can be fetched.

use log::{info, warn};
use std::sync::OnceLock;

#[derive(Debug)]
pub struct ProviderHandle {
    legacy: bool,
}

impl ProviderHandle {
    /// Whether DES, DESede and Blowfish are usable.
    pub fn legacy_loaded(&self) -> bool {
        self.legacy
    }
}

static PROVIDERS: OnceLock<ProviderHandle> = OnceLock::new();

#[cfg(ossl300)]
fn load_legacy() -> bool {
    // keep the default provider reachable as a fallback
    match openssl::provider::Provider::try_load(None, "legacy", true) {
        Ok(provider) => {
            // stays loaded for the life of the process
            std::mem::forget(provider);
            info!("openssl legacy provider loaded");
            true
        }
        Err(e) => {
            warn!(
                "openssl legacy provider unavailable, DES and Blowfish will fail: {}",
                e
            );
            false
        }
    }
}

#[cfg(not(ossl300))]
fn load_legacy() -> bool {
    true
}

/// Registers the providers once per process; later calls return the same
/// handle. Safe to call from any thread.
pub fn init() -> &'static ProviderHandle {
    PROVIDERS.get_or_init(|| {
        openssl::init();
        let handle = ProviderHandle {
            legacy: load_legacy(),
        };
        info!("crypto providers registered: {:?}", handle);
        handle
    })
}

pub fn legacy_loaded() -> bool {
    init().legacy_loaded()
}
