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

#[repr(u32)]
#[derive(Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Debug)]
pub enum CryptoStatusT {
    // generic codes, reserved 000-099
    Success = 0,
    Unknown = 2,
    InvalidArgument = 3,
    Internal = 13,
    // validation failures start at 100
    InvalidKeyLength = 100,
    InvalidModePaddingCombination = 101,
    MissingOrUnexpectedIv = 102,
    UnsupportedAlgorithm = 103,
    InvalidKeyFormat = 104,
    // primitive failures start at 200
    MalformedDerStructure = 200,
    UnderlyingCipherFailure = 201,
}

impl CryptoStatusT {
    pub fn as_str(&self) -> &str {
        match *self {
            CryptoStatusT::Success => "Success",
            CryptoStatusT::Unknown => "Unknown",
            CryptoStatusT::InvalidArgument => "InvalidArgument",
            CryptoStatusT::Internal => "Internal",
            CryptoStatusT::InvalidKeyLength => "InvalidKeyLength",
            CryptoStatusT::InvalidModePaddingCombination => "InvalidModePaddingCombination",
            CryptoStatusT::MissingOrUnexpectedIv => "MissingOrUnexpectedIv",
            CryptoStatusT::UnsupportedAlgorithm => "UnsupportedAlgorithm",
            CryptoStatusT::InvalidKeyFormat => "InvalidKeyFormat",
            CryptoStatusT::MalformedDerStructure => "MalformedDerStructure",
            CryptoStatusT::UnderlyingCipherFailure => "UnderlyingCipherFailure",
        }
    }
}
