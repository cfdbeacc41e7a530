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

//! Legality table for algorithm/mode/padding triples and the per-call checks
//! on key, IV and data length. Everything here is pure.

use super::scheme::{Algorithm, AlgorithmSpec, Mode, Padding};
use cipher_types::*;

// DES takes exactly 8 bytes
const DES_KEY_LENGTH: usize = 8;
// two-key or three-key triple DES
const DESEDE_KEY_LENGTHS: [usize; 2] = [16, 24];
const AES_KEY_LENGTHS: [usize; 3] = [16, 24, 32];
const SM4_KEY_LENGTH: usize = 16;
// 32 to 448 bits
const BLOWFISH_MIN_KEY_LENGTH: usize = 4;
const BLOWFISH_MAX_KEY_LENGTH: usize = 56;

/// Every triple the registry accepts.
pub fn legal_specs() -> Vec<AlgorithmSpec> {
    let mut specs = vec![];
    for algorithm in Algorithm::ALL {
        for mode in Mode::ALL {
            for padding in Padding::ALL {
                if let Ok(spec) = AlgorithmSpec::new(algorithm, mode, padding) {
                    specs.push(spec);
                }
            }
        }
    }
    specs
}

pub(crate) fn check_combination(
    algorithm: Algorithm,
    mode: Mode,
    padding: Padding,
) -> CryptoResult<()> {
    match algorithm {
        Algorithm::Rsa => {
            if !matches!(mode, Mode::None | Mode::Ecb) {
                return_errno!(
                    CryptoStatus::InvalidModePaddingCombination,
                    "RSA has no block mode, got {}",
                    mode
                );
            }
            if !matches!(padding, Padding::NoPadding | Padding::Pkcs1 | Padding::Oaep) {
                return_errno!(
                    CryptoStatus::InvalidModePaddingCombination,
                    "padding {} is not defined for RSA",
                    padding
                );
            }
        }
        Algorithm::Sm2 => {
            if mode != Mode::None || padding != Padding::NoPadding {
                return_errno!(
                    CryptoStatus::InvalidModePaddingCombination,
                    "SM2 only accepts NONE/NoPadding, got {}/{}",
                    mode,
                    padding
                );
            }
        }
        _ => {
            if mode == Mode::None {
                return_errno!(
                    CryptoStatus::InvalidModePaddingCombination,
                    "mode NONE is illegal for symmetric algorithm {}",
                    algorithm
                );
            }
            if matches!(padding, Padding::Ssl3 | Padding::Pkcs1 | Padding::Oaep) {
                return_errno!(
                    CryptoStatus::InvalidModePaddingCombination,
                    "padding {} is illegal for symmetric algorithm {}",
                    padding,
                    algorithm
                );
            }
        }
    }
    Ok(())
}

pub fn check_key_length(algorithm: Algorithm, key_len: usize) -> CryptoResult<()> {
    let legal = match algorithm {
        Algorithm::Des => key_len == DES_KEY_LENGTH,
        Algorithm::DesEde => DESEDE_KEY_LENGTHS.contains(&key_len),
        Algorithm::Aes => AES_KEY_LENGTHS.contains(&key_len),
        Algorithm::Sm4 => key_len == SM4_KEY_LENGTH,
        Algorithm::Blowfish => {
            (BLOWFISH_MIN_KEY_LENGTH..=BLOWFISH_MAX_KEY_LENGTH).contains(&key_len)
        }
        // asymmetric keys are checked when the DER container is parsed
        Algorithm::Rsa | Algorithm::Sm2 => true,
    };
    if !legal {
        return_errno!(
            CryptoStatus::InvalidKeyLength,
            "{} key length {} bytes is illegal",
            algorithm,
            key_len
        );
    }
    Ok(())
}

pub fn check_iv(spec: &AlgorithmSpec, iv_len: Option<usize>) -> CryptoResult<()> {
    let block_size = match spec.block_size() {
        Some(block_size) => block_size,
        None => {
            if iv_len.is_some() {
                return_errno!(
                    CryptoStatus::MissingOrUnexpectedIv,
                    "{} does not take an iv",
                    spec.algorithm()
                );
            }
            return Ok(());
        }
    };
    match (spec.mode(), iv_len) {
        (Mode::Ecb, None) => Ok(()),
        (Mode::Ecb, Some(_)) => Err(errno!(
            CryptoStatus::MissingOrUnexpectedIv,
            "ECB mode does not take an iv"
        )),
        (mode, None) => Err(errno!(
            CryptoStatus::MissingOrUnexpectedIv,
            "{} mode requires an iv",
            mode
        )),
        (_, Some(len)) if len != block_size => Err(errno!(
            CryptoStatus::MissingOrUnexpectedIv,
            "iv length {} is not equal to block size {}",
            len,
            block_size
        )),
        _ => Ok(()),
    }
}

pub fn check_data_length(spec: &AlgorithmSpec, data_len: usize) -> CryptoResult<()> {
    // an SM2 ciphertext always carries a non-empty body
    if spec.algorithm() == Algorithm::Sm2 && data_len == 0 {
        return_errno!(
            CryptoStatus::InvalidModePaddingCombination,
            "SM2 needs at least one byte of data"
        );
    }
    if spec.padding() != Padding::NoPadding || !matches!(spec.mode(), Mode::Ecb | Mode::Cbc) {
        return Ok(());
    }
    if let Some(block_size) = spec.block_size() {
        if data_len % block_size != 0 {
            return_errno!(
                CryptoStatus::InvalidModePaddingCombination,
                "NoPadding with {} needs a multiple of {} bytes, got {}",
                spec.mode(),
                block_size,
                data_len
            );
        }
    }
    Ok(())
}

/// Unpadded RSA encryption and every RSA decryption consume whole
/// modulus-width blocks.
pub fn check_rsa_data_length(
    padding: Padding,
    modulus_len: usize,
    data_len: usize,
    decrypt: bool,
) -> CryptoResult<()> {
    if !decrypt && padding != Padding::NoPadding {
        return Ok(());
    }
    if modulus_len == 0 || data_len == 0 || data_len % modulus_len != 0 {
        return_errno!(
            CryptoStatus::InvalidModePaddingCombination,
            "RSA {} needs whole {} byte blocks, got {} bytes",
            if decrypt { "decryption" } else { "NoPadding" },
            modulus_len,
            data_len
        );
    }
    Ok(())
}

/// Per-call validation, run before any primitive is touched.
pub fn validate(
    spec: &AlgorithmSpec,
    key_len: usize,
    iv_len: Option<usize>,
    data_len: usize,
) -> CryptoResult<()> {
    check_key_length(spec.algorithm(), key_len)?;
    check_iv(spec, iv_len)?;
    check_data_length(spec, data_len)
}
