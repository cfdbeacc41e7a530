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

//! Signature dispatch over RSA, ECDSA and SM2.
//!
//! EC and SM2 signatures come out of OpenSSL as DER; the `_raw` forms convert
//! to and from fixed-length `r || s`. RSA signatures have a single form.

use super::ec_codec::{self, SM2_CURVE_BYTE_LEN};
use super::ecdsa::{EcPrivateKeyHolder, EcPublicKeyHolder};
use super::key::KeyMaterial;
use super::rsa::{RsaPrivateKeyHolder, RsaPublicKeyHolder};
use super::scheme::{KeyAlgorithm, SignatureAlgorithm};
use super::sm2::{Sm2Signer, Sm2Verifier, SM2_ID_DEFAULT};
use super::{signer::Signer, verifier::Verifier};
use cipher_types::*;
use log::debug;

#[derive(Debug, Clone)]
pub struct SignatureEngine {
    sm2_id: Vec<u8>,
}

impl Default for SignatureEngine {
    fn default() -> Self {
        SignatureEngine {
            sm2_id: SM2_ID_DEFAULT.as_bytes().to_vec(),
        }
    }
}

impl SignatureEngine {
    pub fn new() -> SignatureEngine {
        SignatureEngine::default()
    }

    /// Distinguishing identifier for SM3withSM2.
    pub fn with_sm2_id(mut self, id: &[u8]) -> Self {
        self.sm2_id = id.to_vec();
        self
    }

    // Returns the signer and, for curve algorithms, the width of r and s.
    fn signer(
        &self,
        algorithm: SignatureAlgorithm,
        private_key: &KeyMaterial,
    ) -> CryptoResult<(Box<dyn Signer>, Option<usize>)> {
        private_key.expect_algorithm(algorithm.key_algorithm())?;
        let digest = algorithm.digest();
        match algorithm.key_algorithm() {
            KeyAlgorithm::Rsa => Ok((
                Box::new(RsaPrivateKeyHolder::from_key(private_key)?.with_digest(digest)),
                None,
            )),
            KeyAlgorithm::Ec => {
                let holder = EcPrivateKeyHolder::from_key(private_key)?.with_digest(digest);
                let curve_len = holder.curve_byte_len()?;
                Ok((Box::new(holder), Some(curve_len)))
            }
            KeyAlgorithm::Sm2 => Ok((
                Box::new(Sm2Signer::from_key(private_key)?.with_id(&self.sm2_id)),
                Some(SM2_CURVE_BYTE_LEN),
            )),
        }
    }

    fn verifier(
        &self,
        algorithm: SignatureAlgorithm,
        public_key: &KeyMaterial,
    ) -> CryptoResult<(Box<dyn Verifier>, Option<usize>)> {
        public_key.expect_algorithm(algorithm.key_algorithm())?;
        let digest = algorithm.digest();
        match algorithm.key_algorithm() {
            KeyAlgorithm::Rsa => Ok((
                Box::new(RsaPublicKeyHolder::from_key(public_key)?.with_digest(digest)),
                None,
            )),
            KeyAlgorithm::Ec => {
                let holder = EcPublicKeyHolder::from_key(public_key)?.with_digest(digest);
                let curve_len = holder.curve_byte_len()?;
                Ok((Box::new(holder), Some(curve_len)))
            }
            KeyAlgorithm::Sm2 => Ok((
                Box::new(Sm2Verifier::from_key(public_key)?.with_id(&self.sm2_id)),
                Some(SM2_CURVE_BYTE_LEN),
            )),
        }
    }

    /// DER form for EC and SM2.
    pub fn sign(
        &self,
        algorithm: SignatureAlgorithm,
        data: &[u8],
        private_key: &KeyMaterial,
    ) -> CryptoResult<Vec<u8>> {
        let (signer, _) = self.signer(algorithm, private_key)?;
        debug!("{} sign {} bytes", algorithm, data.len());
        signer.sign(data)
    }

    /// Fixed-length `r || s` for EC and SM2.
    pub fn sign_raw(
        &self,
        algorithm: SignatureAlgorithm,
        data: &[u8],
        private_key: &KeyMaterial,
    ) -> CryptoResult<Vec<u8>> {
        let (signer, curve_len) = self.signer(algorithm, private_key)?;
        let signature = signer.sign(data)?;
        match curve_len {
            Some(curve_len) => ec_codec::der_to_raw_signature(&signature, curve_len),
            None => Ok(signature),
        }
    }

    pub fn verify(
        &self,
        algorithm: SignatureAlgorithm,
        data: &[u8],
        public_key: &KeyMaterial,
        signature: &[u8],
    ) -> CryptoResult<bool> {
        let (verifier, _) = self.verifier(algorithm, public_key)?;
        verifier.verify(data, signature)
    }

    pub fn verify_raw(
        &self,
        algorithm: SignatureAlgorithm,
        data: &[u8],
        public_key: &KeyMaterial,
        signature: &[u8],
    ) -> CryptoResult<bool> {
        let (verifier, curve_len) = self.verifier(algorithm, public_key)?;
        let curve_len = match curve_len {
            Some(curve_len) => curve_len,
            None => return verifier.verify(data, signature),
        };
        match ec_codec::raw_to_der_signature(signature, curve_len) {
            Ok(der) => verifier.verify(data, &der),
            Err(e) => {
                debug!("raw signature rejected: {}", e);
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::provider;
    use crate::utils::crypto::key::{self, KeyPair};
    use std::str::FromStr;

    fn key_pair(algorithm: SignatureAlgorithm) -> KeyPair {
        match algorithm.key_algorithm() {
            KeyAlgorithm::Rsa => key::generate_rsa(2048).unwrap(),
            KeyAlgorithm::Ec => key::generate_ec_p256().unwrap(),
            KeyAlgorithm::Sm2 => key::generate_sm2().unwrap(),
        }
    }

    #[test]
    fn every_algorithm_signs_and_verifies() {
        provider::init();
        let engine = SignatureEngine::new();
        let names = [
            "MD5withRSA",
            "SHA1withRSA",
            "SHA256withRSA",
            "SHA384withRSA",
            "SHA512withRSA",
            "SHA1withECDSA",
            "SHA256withECDSA",
            "SHA384withECDSA",
            "SHA512withECDSA",
            "SM3withSM2",
        ];
        for name in names {
            let algorithm = SignatureAlgorithm::from_str(name).unwrap();
            let pair = key_pair(algorithm);
            let data = b"the quick brown fox";
            let signature = engine.sign(algorithm, data, &pair.private_key).unwrap();
            assert!(
                engine
                    .verify(algorithm, data, &pair.public_key, &signature)
                    .unwrap(),
                "{}",
                name
            );
            assert!(!engine
                .verify(algorithm, b"the quick brown fix", &pair.public_key, &signature)
                .unwrap());
        }
    }

    #[test]
    fn raw_forms_are_fixed_length() {
        provider::init();
        let engine = SignatureEngine::new();
        for algorithm in [
            SignatureAlgorithm::Sm3WithSm2,
            SignatureAlgorithm::Sha256WithEcdsa,
        ] {
            let pair = key_pair(algorithm);
            for _ in 0..8 {
                let raw = engine.sign_raw(algorithm, b"hello", &pair.private_key).unwrap();
                assert_eq!(raw.len(), 64);
                assert!(engine
                    .verify_raw(algorithm, b"hello", &pair.public_key, &raw)
                    .unwrap());
                // the DER form verifies too
                let der = ec_codec::raw_to_der_signature(&raw, 32).unwrap();
                assert!(engine
                    .verify(algorithm, b"hello", &pair.public_key, &der)
                    .unwrap());
            }
        }
    }

    #[test]
    fn malformed_signatures_verify_false() {
        provider::init();
        let engine = SignatureEngine::new();
        let algorithm = SignatureAlgorithm::Sm3WithSm2;
        let pair = key_pair(algorithm);
        let raw = engine.sign_raw(algorithm, b"hello", &pair.private_key).unwrap();
        assert!(!engine
            .verify_raw(algorithm, b"hello", &pair.public_key, &raw[..63])
            .unwrap());
        assert!(!engine
            .verify(algorithm, b"hello", &pair.public_key, &raw)
            .unwrap());
        assert!(!engine
            .verify(algorithm, b"hello", &pair.public_key, &[])
            .unwrap());
    }

    #[test]
    fn rsa_raw_is_unchanged() {
        provider::init();
        let engine = SignatureEngine::new();
        let algorithm = SignatureAlgorithm::Sha256WithRsa;
        let pair = key_pair(algorithm);
        let raw = engine.sign_raw(algorithm, b"hello", &pair.private_key).unwrap();
        // PKCS#1 v1.5 signing is deterministic
        let der = engine.sign(algorithm, b"hello", &pair.private_key).unwrap();
        assert_eq!(raw, der);
        assert!(engine
            .verify_raw(algorithm, b"hello", &pair.public_key, &raw)
            .unwrap());
    }

    #[test]
    fn key_family_mismatch_is_an_error() {
        provider::init();
        let engine = SignatureEngine::new();
        let rsa = key::generate_rsa(1024).unwrap();
        let err = engine
            .sign(SignatureAlgorithm::Sm3WithSm2, b"hello", &rsa.private_key)
            .unwrap_err();
        assert_eq!(err.errno(), CryptoStatus::UnsupportedAlgorithm);
        let err = engine
            .verify(SignatureAlgorithm::Sha256WithEcdsa, b"hello", &rsa.public_key, &[0u8; 64])
            .unwrap_err();
        assert_eq!(err.errno(), CryptoStatus::UnsupportedAlgorithm);
    }

    #[test]
    fn sm2_id_must_match() {
        provider::init();
        let pair = key::generate_sm2().unwrap();
        let algorithm = SignatureAlgorithm::Sm3WithSm2;
        let alice = SignatureEngine::new().with_sm2_id(b"ALICE123@YAHOO.COM");
        let signature = alice.sign(algorithm, b"hello", &pair.private_key).unwrap();
        assert!(alice
            .verify(algorithm, b"hello", &pair.public_key, &signature)
            .unwrap());
        assert!(!SignatureEngine::new()
            .verify(algorithm, b"hello", &pair.public_key, &signature)
            .unwrap());
    }
}
