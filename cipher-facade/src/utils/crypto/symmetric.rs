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

use super::scheme::{Algorithm, AlgorithmSpec, Mode};
use super::{decrypter::Decrypter, encrypter::Encrypter, padding, registry};
use crate::provider;
use blowfish::Blowfish;
use cipher_types::*;
use ctr::cipher::{InnerIvInit, KeyInit, StreamCipher};
use ctr::{flavors, Ctr64BE, CtrCore};
use des::{Des, TdesEde3};
use log::debug;
use openssl::nid::Nid;
use openssl::symm::{Cipher, Crypter, Mode as Direction};

// two-key triple DES is run as K1 K2 K1
const DESEDE_TWO_KEY_LENGTH: usize = 16;
const DES_KEY_LENGTH: usize = 8;
const CTR64_BLOCK_SIZE: usize = 8;

/// Block cipher bound to one key and optional IV for a single call.
pub struct SymmetricCipher<'a> {
    spec: AlgorithmSpec,
    key: Vec<u8>,
    iv: Option<&'a [u8]>,
    block_size: usize,
}

impl<'a> SymmetricCipher<'a> {
    pub fn new(spec: AlgorithmSpec, key: &[u8], iv: Option<&'a [u8]>) -> CryptoResult<Self> {
        let block_size = match spec.block_size() {
            Some(block_size) => block_size,
            None => return_errno!(
                CryptoStatus::UnsupportedAlgorithm,
                "{} is not a symmetric algorithm",
                spec.algorithm()
            ),
        };
        registry::check_key_length(spec.algorithm(), key.len())?;
        registry::check_iv(&spec, iv.map(<[u8]>::len))?;
        let key = if spec.algorithm() == Algorithm::DesEde && key.len() == DESEDE_TWO_KEY_LENGTH {
            [key, &key[..DES_KEY_LENGTH]].concat()
        } else {
            key.to_vec()
        };
        Ok(SymmetricCipher {
            spec,
            key,
            iv,
            block_size,
        })
    }

    fn apply(&self, direction: Direction, data: &[u8]) -> CryptoResult<Vec<u8>> {
        let algorithm = self.spec.algorithm();
        let mode = self.spec.mode();
        let iv = if mode == Mode::Ecb { None } else { self.iv };
        if mode == Mode::Ctr && algorithm.block_size() == Some(CTR64_BLOCK_SIZE) {
            // OpenSSL has no CTR for 64-bit block ciphers
            let counter = match iv {
                Some(counter) => counter,
                None => return_errno!(CryptoStatus::MissingOrUnexpectedIv, "CTR mode requires an iv"),
            };
            return ctr64(algorithm, &self.key, counter, data);
        }
        if matches!(algorithm, Algorithm::Des | Algorithm::Blowfish) && !provider::legacy_loaded() {
            return_errno!(
                CryptoStatus::UnsupportedAlgorithm,
                "{} needs the OpenSSL legacy provider",
                algorithm
            );
        }
        match native_cipher(algorithm, mode, self.key.len()) {
            Some(cipher) => run(cipher, direction, &self.key, iv, data),
            None => Err(errno!(
                CryptoStatus::UnsupportedAlgorithm,
                "{} is not available with key length {}",
                self.spec,
                self.key.len()
            )),
        }
    }
}

impl<'a> Encrypter for SymmetricCipher<'a> {
    fn encrypt(&self, data: &[u8]) -> CryptoResult<Vec<u8>> {
        let padded = padding::pad(self.spec.padding(), data, self.block_size)?;
        debug!("{} encrypt {} bytes", self.spec, padded.len());
        self.apply(Direction::Encrypt, &padded)
    }
}

impl<'a> Decrypter for SymmetricCipher<'a> {
    fn decrypt(&self, data: &[u8]) -> CryptoResult<Vec<u8>> {
        debug!("{} decrypt {} bytes", self.spec, data.len());
        let plaintext = self.apply(Direction::Decrypt, data)?;
        padding::unpad(self.spec.padding(), plaintext, self.block_size)
    }
}

fn by_aes_key_length(key_len: usize, ciphers: [fn() -> Cipher; 3]) -> Option<Cipher> {
    match key_len {
        16 => Some(ciphers[0]()),
        24 => Some(ciphers[1]()),
        32 => Some(ciphers[2]()),
        _ => None,
    }
}


fn native_cipher(algorithm: Algorithm, mode: Mode, key_len: usize) -> Option<Cipher> {
    match (algorithm, mode) {
        (Algorithm::Aes, Mode::Ecb) => by_aes_key_length(
            key_len,
            [Cipher::aes_128_ecb, Cipher::aes_192_ecb, Cipher::aes_256_ecb],
        ),
        (Algorithm::Aes, Mode::Cbc) => by_aes_key_length(
            key_len,
            [Cipher::aes_128_cbc, Cipher::aes_192_cbc, Cipher::aes_256_cbc],
        ),
        (Algorithm::Aes, Mode::Cfb) => by_aes_key_length(
            key_len,
            [
                Cipher::aes_128_cfb128,
                Cipher::aes_192_cfb128,
                Cipher::aes_256_cfb128,
            ],
        ),
        (Algorithm::Aes, Mode::Ofb) => by_aes_key_length(
            key_len,
            [Cipher::aes_128_ofb, Cipher::aes_192_ofb, Cipher::aes_256_ofb],
        ),
        (Algorithm::Aes, Mode::Ctr) => by_aes_key_length(
            key_len,
            [Cipher::aes_128_ctr, Cipher::aes_192_ctr, Cipher::aes_256_ctr],
        ),
        (Algorithm::Sm4, Mode::Ecb) => Some(Cipher::sm4_ecb()),
        (Algorithm::Sm4, Mode::Cbc) => Some(Cipher::sm4_cbc()),
        (Algorithm::Sm4, Mode::Cfb) => Some(Cipher::sm4_cfb128()),
        (Algorithm::Sm4, Mode::Ofb) => Some(Cipher::sm4_ofb()),
        (Algorithm::Sm4, Mode::Ctr) => Some(Cipher::sm4_ctr()),
        (Algorithm::Des, Mode::Ecb) => Some(Cipher::des_ecb()),
        (Algorithm::Des, Mode::Cbc) => Some(Cipher::des_cbc()),
        // no Cipher constructor for these two
        (Algorithm::Des, Mode::Cfb) => Cipher::from_nid(Nid::DES_CFB64),
        (Algorithm::Des, Mode::Ofb) => Cipher::from_nid(Nid::DES_OFB64),
        (Algorithm::DesEde, Mode::Ecb) => Some(Cipher::des_ede3()),
        (Algorithm::DesEde, Mode::Cbc) => Some(Cipher::des_ede3_cbc()),
        (Algorithm::DesEde, Mode::Cfb) => Some(Cipher::des_ede3_cfb64()),
        (Algorithm::DesEde, Mode::Ofb) => Cipher::from_nid(Nid::DES_EDE3_OFB64),
        (Algorithm::Blowfish, Mode::Ecb) => Some(Cipher::bf_ecb()),
        (Algorithm::Blowfish, Mode::Cbc) => Some(Cipher::bf_cbc()),
        (Algorithm::Blowfish, Mode::Cfb) => Some(Cipher::bf_cfb64()),
        (Algorithm::Blowfish, Mode::Ofb) => Some(Cipher::bf_ofb()),
        _ => None,
    }
}

// Padding is handled by the caller, so OpenSSL always runs unpadded.
fn run(
    cipher: Cipher,
    direction: Direction,
    key: &[u8],
    iv: Option<&[u8]>,
    data: &[u8],
) -> CryptoResult<Vec<u8>> {
    let mut crypter = Crypter::new(cipher, direction, key, iv).map_err(|e| {
        errno!(
            CryptoStatus::UnderlyingCipherFailure,
            "crypter init error: {:?}",
            e
        )
        .with_cause(e)
    })?;
    crypter.pad(false);
    let mut out = vec![0u8; data.len() + cipher.block_size()];
    let count = crypter.update(data, &mut out).map_err(|e| {
        errno!(
            CryptoStatus::UnderlyingCipherFailure,
            "cipher update error: {:?}",
            e
        )
        .with_cause(e)
    })?;
    let rest = crypter.finalize(&mut out[count..]).map_err(|e| {
        errno!(
            CryptoStatus::UnderlyingCipherFailure,
            "cipher finalize error: {:?}",
            e
        )
        .with_cause(e)
    })?;
    out.truncate(count + rest);
    Ok(out)
}

fn stream_error<E: std::fmt::Debug>(e: E) -> Error {
    errno!(CryptoStatus::UnderlyingCipherFailure, "ctr keystream error: {:?}", e)
}

// The whole 8-byte block is the big-endian counter, wrapping at the top.
fn ctr64(algorithm: Algorithm, key: &[u8], iv: &[u8], data: &[u8]) -> CryptoResult<Vec<u8>> {
    let mut buffer = data.to_vec();
    match algorithm {
        Algorithm::Des => {
            let inner = Des::new_from_slice(key).map_err(stream_error)?;
            let core = CtrCore::<Des, flavors::Ctr64BE>::inner_iv_slice_init(inner, iv)
                .map_err(stream_error)?;
            Ctr64BE::<Des>::from_core(core)
                .try_apply_keystream(&mut buffer)
                .map_err(stream_error)?;
        }
        Algorithm::DesEde => {
            let inner = TdesEde3::new_from_slice(key).map_err(stream_error)?;
            let core = CtrCore::<TdesEde3, flavors::Ctr64BE>::inner_iv_slice_init(inner, iv)
                .map_err(stream_error)?;
            Ctr64BE::<TdesEde3>::from_core(core)
                .try_apply_keystream(&mut buffer)
                .map_err(stream_error)?;
        }
        Algorithm::Blowfish => {
            let inner = <Blowfish as KeyInit>::new_from_slice(key).map_err(stream_error)?;
            let core = CtrCore::<Blowfish, flavors::Ctr64BE>::inner_iv_slice_init(inner, iv)
                .map_err(stream_error)?;
            Ctr64BE::<Blowfish>::from_core(core)
                .try_apply_keystream(&mut buffer)
                .map_err(stream_error)?;
        }
        _ => return_errno!(
            CryptoStatus::UnsupportedAlgorithm,
            "{} has no 64-bit counter mode",
            algorithm
        ),
    }
    debug!("{} CTR over {} bytes", algorithm, data.len());
    Ok(buffer)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::provider;
    use crate::utils::crypto::scheme::Padding;
    use std::str::FromStr;

    fn round_trip(spec: &str, key: &[u8], iv: Option<&[u8]>, plaintext: &[u8]) -> Vec<u8> {
        provider::init();
        let spec = AlgorithmSpec::from_str(spec).unwrap();
        let cipher = SymmetricCipher::new(spec, key, iv).unwrap();
        let ciphertext = cipher.encrypt(plaintext).unwrap();
        assert_eq!(cipher.decrypt(&ciphertext).unwrap(), plaintext);
        ciphertext
    }

    #[test]
    fn aes_128_ecb_known_answer() {
        // FIPS-197 appendix C.1
        provider::init();
        let key = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();
        let plaintext = hex::decode("00112233445566778899aabbccddeeff").unwrap();
        let spec = AlgorithmSpec::new(Algorithm::Aes, Mode::Ecb, Padding::NoPadding).unwrap();
        let ciphertext = SymmetricCipher::new(spec, &key, None)
            .unwrap()
            .encrypt(&plaintext)
            .unwrap();
        assert_eq!(hex::encode(ciphertext), "69c4e0d86a7b0430d8cdb78070b4c55a");
    }

    #[test]
    fn stream_modes_pad_like_block_modes() {
        let key = [7u8; 16];
        let iv = [9u8; 16];
        let ciphertext = round_trip("AES/CFB/PKCS5Padding", &key, Some(&iv[..]), b"hello");
        assert_eq!(ciphertext.len(), 16);
        let ciphertext = round_trip("AES/CTR/NoPadding", &key, Some(&iv[..]), b"hello");
        assert_eq!(ciphertext.len(), 5);
    }

    #[test]
    fn two_key_triple_des_matches_three_key_form() {
        let key16 = hex::decode("0123456789abcdeffedcba9876543210").unwrap();
        let key24 = [&key16[..], &key16[..8]].concat();
        let a = round_trip("DESede/ECB/PKCS5Padding", &key16, None, b"triple des");
        let b = round_trip("DESede/ECB/PKCS5Padding", &key24, None, b"triple des");
        assert_eq!(a, b);
    }

    #[test]
    fn triple_des_ctr_matches_ecb_keystream() {
        let key = [3u8; 24];
        let iv = [0xffu8; 8];
        let data = vec![0x5au8; 13];
        let ciphertext = round_trip("DESede/CTR/NoPadding", &key, Some(&iv[..]), &data);
        assert_eq!(ciphertext.len(), data.len());
        // counter ff..ff wraps to 00..00 for the second block
        let counters = [[0xffu8; 8], [0x00u8; 8]].concat();
        let keystream = openssl::symm::encrypt(Cipher::des_ede3(), &key, None, &counters[..]).unwrap();
        let expected: Vec<u8> = data.iter().zip(keystream.iter()).map(|(d, k)| d ^ k).collect();
        assert_eq!(ciphertext, expected);
    }

    #[test]
    fn short_blowfish_key_in_ctr() {
        let key = b"blow";
        let iv = [1u8; 8];
        let ciphertext = round_trip("Blowfish/CTR/PKCS5Padding", key, Some(&iv[..]), b"hello");
        assert_eq!(ciphertext.len(), 8);
        round_trip("DES/CTR/NoPadding", b"8bytekey", Some(&iv[..]), &[7u8; 21]);
    }

    #[test]
    fn constructor_rechecks_key_and_iv() {
        let spec = AlgorithmSpec::from_str("SM4/CBC/PKCS7Padding").unwrap();
        let err = SymmetricCipher::new(spec, &[0u8; 15], Some(&[0u8; 16][..])).err().unwrap();
        assert_eq!(err.errno(), CryptoStatus::InvalidKeyLength);
        let err = SymmetricCipher::new(spec, &[0u8; 16], None).err().unwrap();
        assert_eq!(err.errno(), CryptoStatus::MissingOrUnexpectedIv);
    }

    #[test]
    fn wrong_key_fails_or_differs() {
        provider::init();
        let spec = AlgorithmSpec::from_str("AES/CBC/PKCS5Padding").unwrap();
        let iv = [1u8; 16];
        let ciphertext = SymmetricCipher::new(spec, &[1u8; 16], Some(&iv[..]))
            .unwrap()
            .encrypt(b"some secret text")
            .unwrap();
        let other = SymmetricCipher::new(spec, &[2u8; 16], Some(&iv[..])).unwrap();
        match other.decrypt(&ciphertext) {
            Ok(plaintext) => assert_ne!(plaintext, b"some secret text"),
            Err(err) => assert_eq!(err.errno(), CryptoStatus::UnderlyingCipherFailure),
        }
    }
}
