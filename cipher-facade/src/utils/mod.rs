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

pub mod crypto;

use base64::{engine::general_purpose, Engine as _};
use cipher_types::*;

#[inline]
pub fn cvt_p<T>(r: *mut T, error_msg: &'static str) -> CryptoResult<*mut T> {
    if r.is_null() {
        return_errno!(
            CryptoStatus::UnderlyingCipherFailure,
            "null ptr: {}",
            error_msg
        );
    } else {
        Ok(r)
    }
}

pub fn base64_encode(buf: &[u8]) -> String {
    general_purpose::STANDARD.encode(buf)
}

// Line breaks and blanks are tolerated so that wrapped text can be pasted as is.
pub fn base64_decode(text: &str, status: CryptoStatus) -> CryptoResult<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| errno!(status, "base64 decode error: {}", e).with_cause(e))
}
