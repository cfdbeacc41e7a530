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

use cipher_types::*;

pub trait Encrypter {
    /// Encrypt data
    ///
    /// # Arguments
    ///
    /// * `data` - A byte slice that should be encrypted, of any length the
    ///   implementation's algorithm accepts
    ///
    /// The whole input is processed or the call fails; partial output is
    /// never returned.
    fn encrypt(&self, data: &[u8]) -> CryptoResult<Vec<u8>>;
}
