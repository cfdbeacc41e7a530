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

use super::key::KeyMaterial;
use super::rsa::message_digest;
use super::scheme::{DigestScheme, KeyAlgorithm};
use super::{signer::Signer, verifier::Verifier};
use cipher_types::*;
use log::debug;
use openssl::pkey::{HasParams, PKey, PKeyRef, Private, Public};

fn curve_byte_len<T: HasParams>(pkey: &PKeyRef<T>) -> CryptoResult<usize> {
    let ec_key = pkey.ec_key().map_err(|e| {
        errno!(CryptoStatus::InvalidKeyFormat, "not an ec key: {}", e).with_cause(e)
    })?;
    Ok(((ec_key.group().degree() + 7) / 8) as usize)
}

pub struct EcPublicKeyHolder {
    public_key: PKey<Public>,
    digest: DigestScheme,
}

impl EcPublicKeyHolder {
    pub fn from_key(key: &KeyMaterial) -> CryptoResult<EcPublicKeyHolder> {
        key.expect_algorithm(KeyAlgorithm::Ec)?;
        Ok(EcPublicKeyHolder {
            public_key: key.public_pkey()?,
            digest: DigestScheme::Sha256,
        })
    }

    pub fn with_digest(mut self, digest: DigestScheme) -> Self {
        self.digest = digest;
        self
    }

    /// Width of one of r and s in the raw signature form.
    pub fn curve_byte_len(&self) -> CryptoResult<usize> {
        curve_byte_len(&*self.public_key)
    }
}

impl Verifier for EcPublicKeyHolder {
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
        match verifier.verify(signature) {
            Ok(res) => Ok(res),
            Err(e) => {
                debug!("ecdsa signature rejected: {}", e);
                Ok(false)
            }
        }
    }
}

pub struct EcPrivateKeyHolder {
    private_key: PKey<Private>,
    digest: DigestScheme,
}

impl EcPrivateKeyHolder {
    pub fn from_key(key: &KeyMaterial) -> CryptoResult<EcPrivateKeyHolder> {
        key.expect_algorithm(KeyAlgorithm::Ec)?;
        Ok(EcPrivateKeyHolder {
            private_key: key.private_pkey()?,
            digest: DigestScheme::Sha256,
        })
    }

    pub fn with_digest(mut self, digest: DigestScheme) -> Self {
        self.digest = digest;
        self
    }

    pub fn curve_byte_len(&self) -> CryptoResult<usize> {
        curve_byte_len(&*self.private_key)
    }
}

impl Signer for EcPrivateKeyHolder {
    /// DER `ECDSA-Sig-Value`.
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
        signer.sign_to_vec().map_err(|e| {
            errno!(
                CryptoStatus::UnderlyingCipherFailure,
                "sign msg error: {:?}",
                e
            )
            .with_cause(e)
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utils::crypto::key;

    #[test]
    fn p256_sign_verify() {
        let pair = key::generate_ec_p256().unwrap();
        let signer = EcPrivateKeyHolder::from_key(&pair.private_key).unwrap();
        let verifier = EcPublicKeyHolder::from_key(&pair.public_key).unwrap();
        assert_eq!(signer.curve_byte_len().unwrap(), 32);
        assert_eq!(verifier.curve_byte_len().unwrap(), 32);
        let signature = signer.sign(b"hello").unwrap();
        assert_eq!(signature[0], 0x30);
        assert!(verifier.verify(b"hello", &signature).unwrap());
        assert!(!verifier.verify(b"hellO", &signature).unwrap());
        assert!(!verifier.verify(b"hello", &signature[..8]).unwrap());
    }

    #[test]
    fn digest_must_match() {
        let pair = key::generate_ec_p256().unwrap();
        let signature = EcPrivateKeyHolder::from_key(&pair.private_key)
            .unwrap()
            .with_digest(DigestScheme::Sha384)
            .sign(b"hello")
            .unwrap();
        let verifier = EcPublicKeyHolder::from_key(&pair.public_key).unwrap();
        assert!(!verifier.verify(b"hello", &signature).unwrap());
        let verifier = verifier.with_digest(DigestScheme::Sha384);
        assert!(verifier.verify(b"hello", &signature).unwrap());
    }

    #[test]
    fn p521_coordinates_round_up() {
        use openssl::ec::{EcGroup, EcKey};
        use openssl::nid::Nid;

        let group = EcGroup::from_curve_name(Nid::SECP521R1).unwrap();
        let pkey = PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap();
        let private_key = KeyMaterial::private_der(pkey.private_key_to_pkcs8().unwrap());
        let public_key = KeyMaterial::public_der(pkey.public_key_to_der().unwrap());
        let signer = EcPrivateKeyHolder::from_key(&private_key).unwrap();
        let verifier = EcPublicKeyHolder::from_key(&public_key).unwrap();
        // 521 bits
        assert_eq!(signer.curve_byte_len().unwrap(), 66);
        assert_eq!(verifier.curve_byte_len().unwrap(), 66);
    }

    #[test]
    fn sm2_key_is_not_an_ecdsa_key() {
        let pair = key::generate_sm2().unwrap();
        let err = EcPublicKeyHolder::from_key(&pair.public_key).err().unwrap();
        assert_eq!(err.errno(), CryptoStatus::UnsupportedAlgorithm);
    }
}
