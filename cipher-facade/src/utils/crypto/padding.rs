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

// Block padding is applied here rather than by OpenSSL so that the stream-like
// modes pad the same way ECB and CBC do.
use super::scheme::Padding;
use cipher_types::*;

pub fn pad(padding: Padding, data: &[u8], block_size: usize) -> CryptoResult<Vec<u8>> {
    let pad_len = block_size - data.len() % block_size;
    let mut padded = Vec::with_capacity(data.len() + pad_len);
    padded.extend_from_slice(data);
    match padding {
        Padding::NoPadding => return Ok(padded),
        Padding::Pkcs5 | Padding::Pkcs7 => {
            padded.resize(data.len() + pad_len, pad_len as u8);
        }
        Padding::Iso10126 => {
            let mut filler = vec![0u8; pad_len - 1];
            openssl::rand::rand_bytes(&mut filler).map_err(|e| {
                errno!(
                    CryptoStatus::UnderlyingCipherFailure,
                    "rand padding failed: {:?}",
                    e
                )
                .with_cause(e)
            })?;
            padded.extend_from_slice(&filler);
            padded.push(pad_len as u8);
        }
        _ => return_errno!(
            CryptoStatus::InvalidModePaddingCombination,
            "{} is not a block padding",
            padding
        ),
    }
    Ok(padded)
}

pub fn unpad(padding: Padding, mut data: Vec<u8>, block_size: usize) -> CryptoResult<Vec<u8>> {
    if padding == Padding::NoPadding {
        return Ok(data);
    }
    let pad_len = match data.last() {
        Some(&last) => last as usize,
        None => return_errno!(CryptoStatus::UnderlyingCipherFailure, "bad padding: no data"),
    };
    if pad_len == 0 || pad_len > block_size || pad_len > data.len() {
        return_errno!(
            CryptoStatus::UnderlyingCipherFailure,
            "bad padding length {}",
            pad_len
        );
    }
    let body_len = data.len() - pad_len;
    match padding {
        Padding::Pkcs5 | Padding::Pkcs7 => {
            if data[body_len..].iter().any(|b| *b as usize != pad_len) {
                return_errno!(CryptoStatus::UnderlyingCipherFailure, "bad pkcs#7 padding");
            }
        }
        // filler bytes are random
        Padding::Iso10126 => {}
        _ => return_errno!(
            CryptoStatus::InvalidModePaddingCombination,
            "{} is not a block padding",
            padding
        ),
    }
    data.truncate(body_len);
    Ok(data)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pkcs7_adds_a_full_block_on_boundary() {
        let padded = pad(Padding::Pkcs7, &[1u8; 8], 8).unwrap();
        assert_eq!(padded.len(), 16);
        assert_eq!(&padded[8..], &[8u8; 8]);
        assert_eq!(unpad(Padding::Pkcs7, padded, 8).unwrap(), vec![1u8; 8]);
    }

    #[test]
    fn iso10126_ends_with_length() {
        let padded = pad(Padding::Iso10126, b"abc", 16).unwrap();
        assert_eq!(padded.len(), 16);
        assert_eq!(padded[15], 13);
        assert_eq!(unpad(Padding::Iso10126, padded, 16).unwrap(), b"abc".to_vec());
    }

    #[test]
    fn corrupted_padding_is_a_cipher_failure() {
        let mut padded = pad(Padding::Pkcs5, b"hello", 8).unwrap();
        padded[6] ^= 0xff;
        let err = unpad(Padding::Pkcs5, padded, 8).unwrap_err();
        assert_eq!(err.errno(), CryptoStatus::UnderlyingCipherFailure);
        let err = unpad(Padding::Pkcs5, vec![], 8).unwrap_err();
        assert_eq!(err.errno(), CryptoStatus::UnderlyingCipherFailure);
        let err = unpad(Padding::Pkcs5, vec![0u8; 8], 8).unwrap_err();
        assert_eq!(err.errno(), CryptoStatus::UnderlyingCipherFailure);
    }

    #[test]
    fn no_padding_is_identity() {
        assert_eq!(pad(Padding::NoPadding, b"abc", 8).unwrap(), b"abc".to_vec());
        assert_eq!(unpad(Padding::NoPadding, b"abc".to_vec(), 8).unwrap(), b"abc".to_vec());
    }
}
