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

//! Chunked processing for primitives that take a bounded amount of input per
//! call, such as RSA.

use super::scheme::Padding;
use cipher_types::*;
use log::debug;

// PKCS#1 v1.5 type 2 block: 0x00 0x02, at least 8 random bytes, 0x00
const PKCS1_OVERHEAD: usize = 11;
// OAEP with SHA-1 and MGF1-SHA-1: 2 * 20 + 2
const OAEP_SHA1_OVERHEAD: usize = 42;

/// Largest plaintext chunk one RSA operation accepts.
pub fn encrypt_block_size(key_bits: u32, padding: Padding) -> CryptoResult<usize> {
    let modulus_len = (key_bits / 8) as usize;
    let overhead = match padding {
        Padding::Pkcs1 => PKCS1_OVERHEAD,
        Padding::Oaep => OAEP_SHA1_OVERHEAD,
        Padding::NoPadding => 0,
        _ => return_errno!(
            CryptoStatus::InvalidModePaddingCombination,
            "padding {} is not defined for RSA",
            padding
        ),
    };
    if modulus_len <= overhead {
        return_errno!(
            CryptoStatus::InvalidKeyLength,
            "{} bit key leaves no room for {} data",
            key_bits,
            padding
        );
    }
    Ok(modulus_len - overhead)
}

/// Ciphertext chunk size: always one full modulus-width block.
pub fn decrypt_block_size(key_bits: u32) -> CryptoResult<usize> {
    let modulus_len = (key_bits / 8) as usize;
    if modulus_len == 0 {
        return_errno!(CryptoStatus::InvalidKeyLength, "key has no modulus");
    }
    Ok(modulus_len)
}

/// Runs `op` over consecutive `block_size` chunks of `data` and concatenates
/// the outputs in order. An empty input is handed to `op` once, so that an
/// empty plaintext still produces a ciphertext block.
///
/// The first failing chunk aborts the whole run; nothing produced before it is
/// returned.
pub fn process<F>(data: &[u8], block_size: usize, mut op: F) -> CryptoResult<Vec<u8>>
where
    F: FnMut(&[u8]) -> CryptoResult<Vec<u8>>,
{
    if block_size == 0 {
        return_errno!(CryptoStatus::InvalidArgument, "block size must not be zero");
    }
    if data.is_empty() {
        return op(data);
    }
    let chunks = (data.len() + block_size - 1) / block_size;
    debug!(
        "segmenting {} bytes into {} chunks of at most {} bytes",
        data.len(),
        chunks,
        block_size
    );
    let mut output = Vec::with_capacity(data.len() + chunks * 16);
    for chunk in data.chunks(block_size) {
        let mut processed = op(chunk)?;
        output.append(&mut processed);
    }
    Ok(output)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn block_sizes_follow_key_length() {
        assert_eq!(encrypt_block_size(1024, Padding::Pkcs1).unwrap(), 117);
        assert_eq!(encrypt_block_size(2048, Padding::Pkcs1).unwrap(), 245);
        assert_eq!(encrypt_block_size(2048, Padding::Oaep).unwrap(), 214);
        assert_eq!(encrypt_block_size(2048, Padding::NoPadding).unwrap(), 256);
        assert_eq!(decrypt_block_size(1024).unwrap(), 128);
        assert_eq!(decrypt_block_size(2048).unwrap(), 256);
    }

    #[test]
    fn tiny_keys_are_rejected() {
        let err = encrypt_block_size(64, Padding::Pkcs1).unwrap_err();
        assert_eq!(err.errno(), CryptoStatus::InvalidKeyLength);
        let err = encrypt_block_size(2048, Padding::Pkcs5).unwrap_err();
        assert_eq!(err.errno(), CryptoStatus::InvalidModePaddingCombination);
    }

    #[test]
    fn chunks_are_processed_in_order() {
        let data: Vec<u8> = (0..=24).collect();
        let mut seen = vec![];
        let output = process(&data, 10, |chunk| {
            seen.push(chunk.len());
            Ok(chunk.iter().rev().cloned().collect())
        })
        .unwrap();
        assert_eq!(seen, vec![10, 10, 5]);
        let mut expected: Vec<u8> = (0..10).rev().collect();
        expected.extend((10..20).rev());
        expected.extend((20..=24).rev());
        assert_eq!(output, expected);
    }

    #[test]
    fn failure_discards_partial_output() {
        let data = [0u8; 30];
        let mut calls = 0;
        let result = process(&data, 10, |chunk| {
            calls += 1;
            if calls == 2 {
                return_errno!(CryptoStatus::UnderlyingCipherFailure, "chunk rejected");
            }
            Ok(chunk.to_vec())
        });
        assert_eq!(result.unwrap_err().errno(), CryptoStatus::UnderlyingCipherFailure);
        assert_eq!(calls, 2);
    }

    #[test]
    fn empty_input_runs_once() {
        let mut calls = 0;
        let output = process(&[], 10, |_| {
            calls += 1;
            Ok(vec![1, 2, 3])
        })
        .unwrap();
        assert_eq!(calls, 1);
        assert_eq!(output, vec![1, 2, 3]);
    }
}
