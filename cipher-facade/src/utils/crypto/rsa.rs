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

use crate::utils::crypto::key::KeyMaterial;
use crate::utils::crypto::scheme::{DigestScheme, KeyAlgorithm, Padding};
use crate::utils::crypto::{
    decrypter::Decrypter, encrypter::Encrypter, segment, signer::Signer, verifier::Verifier,
};
use cipher_types::*;
use log::debug;
use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private, Public};

pub(crate) fn rsa_padding(padding: Padding) -> CryptoResult<openssl::rsa::Padding> {
    match padding {
        Padding::Pkcs1 => Ok(openssl::rsa::Padding::PKCS1),
        Padding::Oaep => Ok(openssl::rsa::Padding::PKCS1_OAEP),
        Padding::NoPadding => Ok(openssl::rsa::Padding::NONE),
        _ => Err(errno!(
            CryptoStatus::InvalidModePaddingCombination,
            "padding {} is not defined for RSA",
            padding
        )),
    }
}

pub(crate) fn message_digest(digest: DigestScheme) -> MessageDigest {
    match digest {
        DigestScheme::Md5 => MessageDigest::md5(),
        DigestScheme::Sha1 => MessageDigest::sha1(),
        DigestScheme::Sha256 => MessageDigest::sha256(),
        DigestScheme::Sha384 => MessageDigest::sha384(),
        DigestScheme::Sha512 => MessageDigest::sha512(),
        DigestScheme::Sm3 => MessageDigest::sm3(),
    }
}

pub struct RsaPublicKeyHolder {
    public_key: PKey<Public>,
    padding: Padding,
    digest: DigestScheme,
}

impl RsaPublicKeyHolder {
    // Parse X509 `SubjectPublicKeyInfo` DER
    pub fn from_key(key: &KeyMaterial) -> CryptoResult<RsaPublicKeyHolder> {
        key.expect_algorithm(KeyAlgorithm::Rsa)?;
        Ok(RsaPublicKeyHolder {
            public_key: key.public_pkey()?,
            padding: Padding::Pkcs1,
            digest: DigestScheme::Sha256,
        })
    }

    pub fn with_padding(mut self, padding: Padding) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_digest(mut self, digest: DigestScheme) -> Self {
        self.digest = digest;
        self
    }

    pub fn key_bits(&self) -> u32 {
        self.public_key.bits()
    }
}

impl Encrypter for RsaPublicKeyHolder {
    // RSA encrypt, one modulus-bounded chunk at a time
    fn encrypt(&self, data: &[u8]) -> CryptoResult<Vec<u8>> {
        let block_size = segment::encrypt_block_size(self.key_bits(), self.padding)?;
        let modulus_len = segment::decrypt_block_size(self.key_bits())?;
        let mut encrypter = openssl::encrypt::Encrypter::new(&self.public_key).map_err(|e| {
            errno!(
                CryptoStatus::UnderlyingCipherFailure,
                "encrypter init error: {:?}",
                e
            )
            .with_cause(e)
        })?;
        // Set RSA padding
        encrypter
            .set_rsa_padding(rsa_padding(self.padding)?)
            .map_err(|e| {
                errno!(
                    CryptoStatus::UnderlyingCipherFailure,
                    "set rsa padding error: {}",
                    e
                )
                .with_cause(e)
            })?;
        debug!(
            "rsa encrypt {} bytes, {} bit key, {}",
            data.len(),
            self.key_bits(),
            self.padding
        );
        segment::process(data, block_size, |chunk| {
            // Create an output buffer
            let buffer_len = encrypter.encrypt_len(chunk).map_err(|e| {
                errno!(
                    CryptoStatus::UnderlyingCipherFailure,
                    "get cipher_text length error: {}",
                    e
                )
                .with_cause(e)
            })?;
            let mut encrypted = vec![0; buffer_len];
            // Encrypt and truncate the buffer
            let encrypted_len = encrypter.encrypt(chunk, &mut encrypted).map_err(|e| {
                errno!(
                    CryptoStatus::UnderlyingCipherFailure,
                    "encrypt error: {:?}",
                    e
                )
                .with_cause(e)
            })?;
            encrypted.truncate(encrypted_len);
            // decryption splits on modulus-width blocks
            crypto_assert_eq!(encrypted.len(), modulus_len);
            Ok(encrypted)
        })
    }
}

impl Verifier for RsaPublicKeyHolder {
    fn verify(&self, data: &[u8], signature: &[u8]) -> CryptoResult<bool> {
        let mut verifier =
            openssl::sign::Verifier::new(message_digest(self.digest), &self.public_key).map_err(
                |e| {
                    errno!(
                        CryptoStatus::UnderlyingCipherFailure,
                        "verifier create error: {:?}",
                        e
                    )
                    .with_cause(e)
                },
            )?;
        verifier.update(data).map_err(|e| {
            errno!(
                CryptoStatus::UnderlyingCipherFailure,
                "update msg error: {:?}",
                e
            )
            .with_cause(e)
        })?;
        // a signature of the wrong size is reported as an error by OpenSSL
        match verifier.verify(signature) {
            Ok(res) => Ok(res),
            Err(e) => {
                debug!("rsa signature rejected: {}", e);
                Ok(false)
            }
        }
    }
}

pub struct RsaPrivateKeyHolder {
    private_key: PKey<Private>,
    padding: Padding,
    digest: DigestScheme,
}

impl RsaPrivateKeyHolder {
    // Parse PKCS#8 `PrivateKeyInfo` DER
    pub fn from_key(key: &KeyMaterial) -> CryptoResult<RsaPrivateKeyHolder> {
        key.expect_algorithm(KeyAlgorithm::Rsa)?;
        Ok(RsaPrivateKeyHolder {
            private_key: key.private_pkey()?,
            padding: Padding::Pkcs1,
            digest: DigestScheme::Sha256,
        })
    }

    pub fn with_padding(mut self, padding: Padding) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_digest(mut self, digest: DigestScheme) -> Self {
        self.digest = digest;
        self
    }

    pub fn key_bits(&self) -> u32 {
        self.private_key.bits()
    }
}

impl Decrypter for RsaPrivateKeyHolder {
    // RSA decrypt, one modulus-width block at a time
    fn decrypt(&self, encrypted: &[u8]) -> CryptoResult<Vec<u8>> {
        let block_size = segment::decrypt_block_size(self.key_bits())?;
        let mut decrypter = openssl::encrypt::Decrypter::new(&self.private_key).map_err(|e| {
            errno!(
                CryptoStatus::UnderlyingCipherFailure,
                "decrypter init error: {}",
                e
            )
            .with_cause(e)
        })?;
        decrypter
            .set_rsa_padding(rsa_padding(self.padding)?)
            .map_err(|e| {
                errno!(
                    CryptoStatus::UnderlyingCipherFailure,
                    "set rsa padding error: {}",
                    e
                )
                .with_cause(e)
            })?;
        debug!(
            "rsa decrypt {} bytes, {} bit key, {}",
            encrypted.len(),
            self.key_bits(),
            self.padding
        );
        segment::process(encrypted, block_size, |chunk| {
            // Create an output buffer
            let buffer_len = decrypter.decrypt_len(chunk).map_err(|e| {
                errno!(
                    CryptoStatus::UnderlyingCipherFailure,
                    "get plain_text length error: {}",
                    e
                )
                .with_cause(e)
            })?;
            let mut decrypted = vec![0u8; buffer_len];
            // Decrypt and truncate the buffer
            let decrypted_len = decrypter.decrypt(chunk, &mut decrypted).map_err(|e| {
                errno!(
                    CryptoStatus::UnderlyingCipherFailure,
                    "decrypt error: {}",
                    e
                )
                .with_cause(e)
            })?;
            decrypted.truncate(decrypted_len);
            Ok(decrypted)
        })
    }
}

impl Signer for RsaPrivateKeyHolder {
    fn sign(&self, data: &[u8]) -> CryptoResult<Vec<u8>> {
        let mut signer = openssl::sign::Signer::new(message_digest(self.digest), &self.private_key)
            .map_err(|e| {
                errno!(
                    CryptoStatus::UnderlyingCipherFailure,
                    "signer create error: {:?}",
                    e
                )
                .with_cause(e)
            })?;
        signer.update(data).map_err(|e| {
            errno!(
                CryptoStatus::UnderlyingCipherFailure,
                "update msg error: {:?}",
                e
            )
            .with_cause(e)
        })?;
        let sig = signer.sign_to_vec().map_err(|e| {
            errno!(
                CryptoStatus::UnderlyingCipherFailure,
                "sign msg error: {:?}",
                e
            )
            .with_cause(e)
        })?;
        Ok(sig)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::provider;
    use crate::utils::crypto::key;

    #[test]
    fn segmented_round_trip_1024_and_2048() {
        provider::init();
        let plaintext: Vec<u8> = (0..500u32).map(|i| (i % 251) as u8).collect();
        for bits in [1024, 2048] {
            let pair = key::generate_rsa(bits).unwrap();
            let encrypter = RsaPublicKeyHolder::from_key(&pair.public_key).unwrap();
            let decrypter = RsaPrivateKeyHolder::from_key(&pair.private_key).unwrap();
            let encrypted = encrypter.encrypt(&plaintext).unwrap();
            let modulus_len = (bits / 8) as usize;
            let block = modulus_len - 11;
            let chunks = (plaintext.len() + block - 1) / block;
            assert_eq!(encrypted.len(), chunks * modulus_len);
            assert_eq!(decrypter.decrypt(&encrypted).unwrap(), plaintext);
        }
    }

    #[test]
    fn oaep_round_trip() {
        provider::init();
        let pair = key::generate_rsa(2048).unwrap();
        let plaintext = vec![0x42u8; 600];
        let encrypted = RsaPublicKeyHolder::from_key(&pair.public_key)
            .unwrap()
            .with_padding(Padding::Oaep)
            .encrypt(&plaintext)
            .unwrap();
        assert_eq!(encrypted.len(), 3 * 256);
        let decrypted = RsaPrivateKeyHolder::from_key(&pair.private_key)
            .unwrap()
            .with_padding(Padding::Oaep)
            .decrypt(&encrypted)
            .unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn corrupted_block_fails_whole_decryption() {
        provider::init();
        let pair = key::generate_rsa(1024).unwrap();
        let mut encrypted = RsaPublicKeyHolder::from_key(&pair.public_key)
            .unwrap()
            .encrypt(&[1u8; 300])
            .unwrap();
        // last of three blocks
        encrypted[300] ^= 0x5a;
        let err = RsaPrivateKeyHolder::from_key(&pair.private_key)
            .unwrap()
            .decrypt(&encrypted)
            .err()
            .unwrap();
        assert_eq!(err.errno(), CryptoStatus::UnderlyingCipherFailure);
    }

    #[test]
    fn rsa_sign_verify() {
        provider::init();
        let pair = key::generate_rsa(2048).unwrap();
        let buffer = "hello".as_bytes();
        let signer = RsaPrivateKeyHolder::from_key(&pair.private_key)
            .unwrap()
            .with_digest(DigestScheme::Sha512);
        let verifier = RsaPublicKeyHolder::from_key(&pair.public_key)
            .unwrap()
            .with_digest(DigestScheme::Sha512);
        let signature = signer.sign(buffer).unwrap();
        assert_eq!(signature.len(), 256);
        assert!(verifier.verify(buffer, &signature).unwrap());
        assert!(!verifier.verify(b"hellO", &signature).unwrap());
        assert!(!verifier.verify(buffer, &signature[1..]).unwrap());
    }
}
