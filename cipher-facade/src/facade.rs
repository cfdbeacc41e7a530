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

//! Single entry point for encryption, decryption and signatures.
//!
//! Every call validates the algorithm triple, key length, IV and data length
//! before any primitive runs. Byte forms are canonical; the string forms
//! wrap them with Base64 for ciphertext and signatures and UTF-8 for
//! plaintext.

use crate::provider;
use crate::utils::crypto::ec_codec;
use crate::utils::crypto::key::KeyMaterial;
use crate::utils::crypto::registry;
use crate::utils::crypto::rsa::{RsaPrivateKeyHolder, RsaPublicKeyHolder};
use crate::utils::crypto::scheme::{Algorithm, AlgorithmSpec, SignatureAlgorithm, Sm2Mode};
use crate::utils::crypto::signature::SignatureEngine;
use crate::utils::crypto::sm2::{Sm2Decrypter, Sm2Encrypter};
use crate::utils::crypto::symmetric::SymmetricCipher;
use crate::utils::crypto::{decrypter::Decrypter, encrypter::Encrypter};
use crate::utils::{base64_decode, base64_encode};
use cipher_types::*;
use log::debug;

/// Algorithm, key and IV for one call.
#[derive(Debug, Clone, Copy)]
pub struct CipherContext<'a> {
    spec: AlgorithmSpec,
    key: &'a KeyMaterial,
    iv: Option<&'a [u8]>,
}

impl<'a> CipherContext<'a> {
    pub fn new(spec: AlgorithmSpec, key: &'a KeyMaterial, iv: Option<&'a [u8]>) -> Self {
        CipherContext { spec, key, iv }
    }

    pub fn validate(&self, data_len: usize) -> CryptoResult<()> {
        registry::validate(
            &self.spec,
            self.key.len(),
            self.iv.map(<[u8]>::len),
            data_len,
        )
    }
}

#[derive(Debug, Clone)]
pub struct CipherFacade {
    sm2_mode: Sm2Mode,
    signatures: SignatureEngine,
}

impl Default for CipherFacade {
    fn default() -> Self {
        CipherFacade::new()
    }
}

impl CipherFacade {
    pub fn new() -> CipherFacade {
        provider::init();
        CipherFacade {
            sm2_mode: Sm2Mode::default(),
            signatures: SignatureEngine::new(),
        }
    }

    /// Layout of the flat SM2 ciphertext.
    pub fn with_sm2_mode(mut self, sm2_mode: Sm2Mode) -> Self {
        self.sm2_mode = sm2_mode;
        self
    }

    pub fn with_sm2_id(mut self, id: &[u8]) -> Self {
        self.signatures = self.signatures.with_sm2_id(id);
        self
    }

    pub fn sm2_mode(&self) -> Sm2Mode {
        self.sm2_mode
    }

    pub fn encrypt(
        &self,
        spec: &AlgorithmSpec,
        key: &KeyMaterial,
        iv: Option<&[u8]>,
        data: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        let context = CipherContext::new(*spec, key, iv);
        context.validate(data.len())?;
        match spec.algorithm() {
            Algorithm::Rsa => {
                let holder = RsaPublicKeyHolder::from_key(key)?.with_padding(spec.padding());
                registry::check_rsa_data_length(
                    spec.padding(),
                    (holder.key_bits() / 8) as usize,
                    data.len(),
                    false,
                )?;
                holder.encrypt(data)
            }
            Algorithm::Sm2 => {
                let der = Sm2Encrypter::from_key(key)?.encrypt(data)?;
                ec_codec::der_to_flat(&der, self.sm2_mode)
            }
            _ => SymmetricCipher::new(*spec, key.as_bytes(), iv)?.encrypt(data),
        }
    }

    pub fn decrypt(
        &self,
        spec: &AlgorithmSpec,
        key: &KeyMaterial,
        iv: Option<&[u8]>,
        data: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        let context = CipherContext::new(*spec, key, iv);
        context.validate(data.len())?;
        match spec.algorithm() {
            Algorithm::Rsa => {
                let holder = RsaPrivateKeyHolder::from_key(key)?.with_padding(spec.padding());
                registry::check_rsa_data_length(
                    spec.padding(),
                    (holder.key_bits() / 8) as usize,
                    data.len(),
                    true,
                )?;
                holder.decrypt(data)
            }
            Algorithm::Sm2 => {
                let der = ec_codec::flat_to_der(data, self.sm2_mode)?;
                Sm2Decrypter::from_key(key)?.decrypt(&der)
            }
            _ => SymmetricCipher::new(*spec, key.as_bytes(), iv)?.decrypt(data),
        }
    }

    /// UTF-8 plaintext in, Base64 ciphertext out.
    pub fn encrypt_base64(
        &self,
        spec: &AlgorithmSpec,
        key: &KeyMaterial,
        iv: Option<&[u8]>,
        plaintext: &str,
    ) -> CryptoResult<String> {
        let encrypted = self.encrypt(spec, key, iv, plaintext.as_bytes())?;
        Ok(base64_encode(&encrypted))
    }

    /// Base64 ciphertext in, UTF-8 plaintext out.
    pub fn decrypt_str(
        &self,
        spec: &AlgorithmSpec,
        key: &KeyMaterial,
        iv: Option<&[u8]>,
        ciphertext: &str,
    ) -> CryptoResult<String> {
        let encrypted = base64_decode(ciphertext, CryptoStatus::InvalidArgument)?;
        let decrypted = self.decrypt(spec, key, iv, &encrypted)?;
        String::from_utf8(decrypted).map_err(|e| {
            errno!(
                CryptoStatus::InvalidArgument,
                "plaintext is not utf-8: {}",
                e
            )
            .with_cause(e)
        })
    }

    /// SM2 encryption returning GM/T 0009-2012 DER instead of the flat form.
    pub fn encrypt_sm2_der(&self, public_key: &KeyMaterial, data: &[u8]) -> CryptoResult<Vec<u8>> {
        let der = Sm2Encrypter::from_key(public_key)?.encrypt(data)?;
        debug!("sm2 der ciphertext of {} bytes", der.len());
        Ok(der)
    }

    pub fn decrypt_sm2_der(&self, private_key: &KeyMaterial, der: &[u8]) -> CryptoResult<Vec<u8>> {
        // normalize through the codec so that only well-formed DER reaches OpenSSL
        let components = ec_codec::Sm2CipherComponents::from_der(
            der,
            ec_codec::SM2_CURVE_BYTE_LEN,
            ec_codec::SM3_DIGEST_LEN,
        )?;
        let der = components.to_der(ec_codec::SM2_CURVE_BYTE_LEN)?;
        Sm2Decrypter::from_key(private_key)?.decrypt(&der)
    }

    pub fn sign(
        &self,
        algorithm: SignatureAlgorithm,
        data: &[u8],
        private_key: &KeyMaterial,
    ) -> CryptoResult<Vec<u8>> {
        self.signatures.sign(algorithm, data, private_key)
    }

    pub fn sign_raw(
        &self,
        algorithm: SignatureAlgorithm,
        data: &[u8],
        private_key: &KeyMaterial,
    ) -> CryptoResult<Vec<u8>> {
        self.signatures.sign_raw(algorithm, data, private_key)
    }

    pub fn verify(
        &self,
        algorithm: SignatureAlgorithm,
        data: &[u8],
        public_key: &KeyMaterial,
        signature: &[u8],
    ) -> CryptoResult<bool> {
        self.signatures.verify(algorithm, data, public_key, signature)
    }

    pub fn verify_raw(
        &self,
        algorithm: SignatureAlgorithm,
        data: &[u8],
        public_key: &KeyMaterial,
        signature: &[u8],
    ) -> CryptoResult<bool> {
        self.signatures
            .verify_raw(algorithm, data, public_key, signature)
    }

    /// Signs UTF-8 text, returning the Base64 signature.
    pub fn sign_base64(
        &self,
        algorithm: SignatureAlgorithm,
        text: &str,
        private_key: &KeyMaterial,
    ) -> CryptoResult<String> {
        let signature = self.sign(algorithm, text.as_bytes(), private_key)?;
        Ok(base64_encode(&signature))
    }

    /// A signature that is not valid Base64 verifies as false.
    pub fn verify_base64(
        &self,
        algorithm: SignatureAlgorithm,
        text: &str,
        public_key: &KeyMaterial,
        signature: &str,
    ) -> CryptoResult<bool> {
        let signature = match base64_decode(signature, CryptoStatus::InvalidArgument) {
            Ok(signature) => signature,
            Err(e) => {
                debug!("signature rejected: {}", e);
                return Ok(false);
            }
        };
        self.verify(algorithm, text.as_bytes(), public_key, &signature)
    }

    /// Base64 of a fixed-length `r || s` signature; bad Base64 verifies as false.
    pub fn verify_raw_base64(
        &self,
        algorithm: SignatureAlgorithm,
        text: &str,
        public_key: &KeyMaterial,
        signature: &str,
    ) -> CryptoResult<bool> {
        let signature = match base64_decode(signature, CryptoStatus::InvalidArgument) {
            Ok(signature) => signature,
            Err(e) => {
                debug!("raw signature rejected: {}", e);
                return Ok(false);
            }
        };
        self.verify_raw(algorithm, text.as_bytes(), public_key, &signature)
    }
}
