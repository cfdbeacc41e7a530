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

pub mod decrypter;
pub mod ec_codec;
pub mod ecdsa;
pub mod encrypter;
pub mod key;
pub mod padding;
pub mod registry;
pub mod rsa;
pub mod scheme;
pub mod segment;
pub mod signature;
pub mod signer;
pub mod sm2;
pub mod symmetric;
pub mod verifier;

#[cfg(test)]
mod test {
    use crate::provider;
    use crate::utils::crypto::key::{self, KeyEncoding, KeyMaterial};
    use crate::utils::crypto::rsa::{RsaPrivateKeyHolder, RsaPublicKeyHolder};
    use crate::utils::crypto::sm2::{Sm2Decrypter, Sm2Encrypter};
    use crate::utils::crypto::{decrypter::Decrypter, encrypter::Encrypter};

    // keys exchanged as Base64 text load the same as the generated ones
    #[test]
    fn rsa_keys_from_base64() {
        provider::init();
        let pair = key::generate_rsa(3072).unwrap();
        let public_key =
            KeyMaterial::from_base64(&pair.public_key.to_base64(), KeyEncoding::X509Public)
                .unwrap();
        let private_key =
            KeyMaterial::from_base64(&pair.private_key.to_base64(), KeyEncoding::Pkcs8Private)
                .unwrap();

        let buffer = "hello".as_bytes();
        let encryptor = RsaPublicKeyHolder::from_key(&public_key).unwrap();
        let decryptor = RsaPrivateKeyHolder::from_key(&private_key).unwrap();
        let enc_data = encryptor.encrypt(buffer).unwrap();
        assert_eq!(enc_data.len(), 384);
        let dec_data = decryptor.decrypt(&enc_data).unwrap();
        assert_eq!(buffer, dec_data);
    }

    #[test]
    fn sm2_keys_from_pem() {
        provider::init();
        let pair = key::generate_sm2().unwrap();
        let pem = |label: &str, key: &KeyMaterial| {
            let body: String = key
                .to_base64()
                .as_bytes()
                .chunks(64)
                .map(|line| format!("{}\n", std::str::from_utf8(line).unwrap()))
                .collect();
            format!("-----BEGIN {0}-----\n{1}-----END {0}-----\n", label, body)
        };
        let public_key = KeyMaterial::from_pem(&pem("PUBLIC KEY", &pair.public_key)).unwrap();
        let private_key = KeyMaterial::from_pem(&pem("PRIVATE KEY", &pair.private_key)).unwrap();

        let encryptor = Sm2Encrypter::from_key(&public_key).unwrap();
        let decryptor = Sm2Decrypter::from_key(&private_key).unwrap();
        let enc_data = encryptor.encrypt(b"hello").unwrap();
        assert_eq!(decryptor.decrypt(&enc_data).unwrap(), b"hello".to_vec());
    }
}
