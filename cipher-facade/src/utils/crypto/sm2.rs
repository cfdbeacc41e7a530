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

// because rust-openssl doesn't support sm2，we simply wrap openssl c-API
use super::key::KeyMaterial;
use super::scheme::KeyAlgorithm;
use super::{decrypter::Decrypter, encrypter::Encrypter, signer::Signer, verifier::Verifier};
use crate::utils::cvt_p;
use cipher_types::*;
use libc::{c_long, size_t};
use log::debug;
use openssl_sys::*;
use std::os::raw::{c_int, c_void};
use std::ptr;

// The default sm2 id.
// Ref the last chapter of
// http://www.gmbz.org.cn/main/viewfile/2018011001400692565.html
pub const SM2_ID_DEFAULT: &str = "1234567812345678";

// NID_sm2: https://github.com/openssl/openssl/blob/master/include/openssl/obj_mac.h
#[cfg(not(ossl300))]
const EVP_PKEY_SM2: i32 = 1172;

#[cfg(not(ossl300))]
const EVP_PKEY_CTRL_SET1_ID: i32 = 0x1000 + 11;

extern "C" {
    // OpenSSL documentation at [`EVP_PKEY_set_alias_type`].
    //
    // [EVP_PKEY_set_alias_type]: https://www.openssl.org/docs/man1.1.1/man3/EVP_PKEY_set_alias_type.html
    #[cfg(not(ossl300))]
    pub fn EVP_PKEY_set_alias_type(pkey: *mut EVP_PKEY, ttype: c_int) -> c_int;

    // returns void in both 1.1.1 and 3.x
    pub fn EVP_MD_CTX_set_pkey_ctx(ctx: *mut EVP_MD_CTX, sctx: *mut EVP_PKEY_CTX);

    #[cfg(not(ossl300))]
    pub fn EVP_PKEY_CTX_ctrl(
        pctx: *mut EVP_PKEY_CTX,
        keytype: c_int,
        optype: c_int,
        cmd: c_int,
        p1: c_int,
        p2: *mut c_void,
    ) -> c_int;

    // OpenSSL documentation at [`EVP_PKEY_CTX_set1_id`].
    //
    // [EVP_PKEY_CTX_set1_id]: https://www.openssl.org/docs/man3.0/man3/EVP_PKEY_CTX_set1_id.html
    #[cfg(ossl300)]
    pub fn EVP_PKEY_CTX_set1_id(ctx: *mut EVP_PKEY_CTX, id: *const c_void, len: c_int) -> c_int;
}

// Drains the OpenSSL error queue into the returned error.
fn openssl_failure(msg: &str) -> Error {
    let stack = openssl::error::ErrorStack::get();
    errno!(
        CryptoStatus::UnderlyingCipherFailure,
        "{}: {}",
        msg,
        stack
    )
    .with_cause(stack)
}

// A key OpenSSL refused to parse, with the reason it gave.
fn invalid_key(msg: &str) -> Error {
    let stack = openssl::error::ErrorStack::get();
    errno!(CryptoStatus::InvalidKeyFormat, "{}: {}", msg, stack).with_cause(stack)
}

pub struct Sm2Key {
    evp_key: *mut EVP_PKEY,
}

impl Drop for Sm2Key {
    fn drop(&mut self) {
        unsafe {
            EVP_PKEY_free(self.evp_key);
        }
    }
}

struct EvpPkeyCtxWapper {
    evp_ctx: *mut EVP_PKEY_CTX,
}

impl Drop for EvpPkeyCtxWapper {
    fn drop(&mut self) {
        unsafe {
            EVP_PKEY_CTX_free(self.evp_ctx);
        }
    }
}

impl EvpPkeyCtxWapper {
    fn new(key: &Sm2Key) -> CryptoResult<EvpPkeyCtxWapper> {
        let evp_ctx = unsafe {
            cvt_p(
                EVP_PKEY_CTX_new(key.as_ptr(), ptr::null_mut()),
                "EVP_PKEY_CTX_new failed.",
            )?
        };
        Ok(EvpPkeyCtxWapper { evp_ctx })
    }

    fn as_ptr(&self) -> *mut EVP_PKEY_CTX {
        self.evp_ctx
    }

    // The id takes part in the Z value hashed ahead of the message, so signer
    // and verifier must agree on it.
    #[cfg(ossl300)]
    fn set_sm2_id(&self, id: &[u8]) -> CryptoResult<()> {
        let r = unsafe {
            EVP_PKEY_CTX_set1_id(self.as_ptr(), id.as_ptr() as *const c_void, id.len() as c_int)
        };
        if r <= 0 {
            return Err(openssl_failure("EVP_PKEY_CTX_set1_id failed"));
        }
        Ok(())
    }

    #[cfg(not(ossl300))]
    fn set_sm2_id(&self, id: &[u8]) -> CryptoResult<()> {
        let mut id = id.to_vec();
        if unsafe {
            EVP_PKEY_CTX_ctrl(
                self.as_ptr(),
                -1,
                -1,
                EVP_PKEY_CTRL_SET1_ID,
                id.len() as c_int,
                id.as_mut_ptr() as *mut _,
            )
        } <= 0
        {
            return Err(openssl_failure("EVP_PKEY_CTX_ctrl error"));
        }
        Ok(())
    }
}

struct MdCtxWapper {
    md_ctx: *mut EVP_MD_CTX,
}

impl Drop for MdCtxWapper {
    fn drop(&mut self) {
        unsafe {
            EVP_MD_CTX_free(self.md_ctx);
        }
    }
}

// md_ctx does not own evp_ctx; fields drop in order, md_ctx first
struct DigestCtx {
    md_ctx: MdCtxWapper,
    #[allow(unused)]
    evp_ctx: EvpPkeyCtxWapper,
}

impl DigestCtx {
    fn as_ptr(&self) -> *mut EVP_MD_CTX {
        self.md_ctx.md_ctx
    }
}

impl Sm2Key {
    pub fn as_ptr(&self) -> *mut EVP_PKEY {
        self.evp_key
    }

    #[cfg(ossl300)]
    fn into_sm2(self) -> CryptoResult<Sm2Key> {
        // keys on the SM2 curve already load as SM2 keys
        Ok(self)
    }

    #[cfg(not(ossl300))]
    fn into_sm2(self) -> CryptoResult<Sm2Key> {
        if unsafe { EVP_PKEY_set_alias_type(self.as_ptr(), EVP_PKEY_SM2) } != 1 {
            return Err(openssl_failure("EVP_PKEY_set_alias_type failed"));
        }
        Ok(self)
    }

    // Parse X509 `SubjectPublicKeyInfo` DER
    //
    // OpenSSL documentation at [`d2i_PUBKEY`].
    //
    // [`d2i_PUBKEY`]: https://www.openssl.org/docs/man1.1.1/man3/d2i_PUBKEY.html
    pub fn public_key_from_der(der: &[u8]) -> CryptoResult<Sm2Key> {
        let mut p = der.as_ptr();
        let evp_key = unsafe {
            cvt_p(
                d2i_PUBKEY(ptr::null_mut(), &mut p, der.len() as c_long),
                "d2i_PUBKEY failed.",
            )
        }
        .map_err(|e| invalid_key(e.message()))?;
        Sm2Key { evp_key }.into_sm2()
    }

    // Parse PKCS#8 `PrivateKeyInfo` DER
    //
    // OpenSSL documentation at [`d2i_AutoPrivateKey`].
    //
    // [`d2i_AutoPrivateKey`]: https://www.openssl.org/docs/man1.1.1/man3/d2i_AutoPrivateKey.html
    pub fn private_key_from_der(der: &[u8]) -> CryptoResult<Sm2Key> {
        let mut p = der.as_ptr();
        let evp_key = unsafe {
            cvt_p(
                d2i_AutoPrivateKey(ptr::null_mut(), &mut p, der.len() as c_long),
                "d2i_AutoPrivateKey failed.",
            )
        }
        .map_err(|e| invalid_key(e.message()))?;
        Sm2Key { evp_key }.into_sm2()
    }

    fn digest_ctx(&self, id: &[u8], sign: bool) -> CryptoResult<DigestCtx> {
        unsafe {
            let md_ctx = MdCtxWapper {
                md_ctx: cvt_p(EVP_MD_CTX_new(), "EVP_MD_CTX_new failed.")?,
            };
            let evp_ctx = EvpPkeyCtxWapper::new(self)?;
            evp_ctx.set_sm2_id(id)?;
            EVP_MD_CTX_set_pkey_ctx(md_ctx.md_ctx, evp_ctx.as_ptr());
            let ctx = DigestCtx { md_ctx, evp_ctx };
            let r = if sign {
                EVP_DigestSignInit(
                    ctx.as_ptr(),
                    ptr::null_mut(),
                    EVP_sm3(),
                    ptr::null_mut(),
                    self.as_ptr(),
                )
            } else {
                EVP_DigestVerifyInit(
                    ctx.as_ptr(),
                    ptr::null_mut(),
                    EVP_sm3(),
                    ptr::null_mut(),
                    self.as_ptr(),
                )
            };
            if r != 1 {
                return Err(openssl_failure("EVP_DigestSignInit/EVP_DigestVerifyInit error"));
            }
            Ok(ctx)
        }
    }
}

pub struct Sm2Encrypter {
    public_key: Sm2Key,
}

impl Sm2Encrypter {
    pub fn from_key(key: &KeyMaterial) -> CryptoResult<Sm2Encrypter> {
        key.expect_algorithm(KeyAlgorithm::Sm2)?;
        Ok(Sm2Encrypter {
            public_key: Sm2Key::public_key_from_der(key.public_der_bytes()?)?,
        })
    }
}

impl Encrypter for Sm2Encrypter {
    /// Output is the DER `SM2Cipher` structure OpenSSL produces.
    ///
    /// OpenSSL documentation at [`EVP_PKEY_encrypt`].
    ///
    /// [`EVP_PKEY_encrypt`]: https://www.openssl.org/docs/manmaster/man3/EVP_PKEY_encrypt.html
    fn encrypt(&self, data: &[u8]) -> CryptoResult<Vec<u8>> {
        // OpenSSL cannot produce an empty C2
        if data.is_empty() {
            return_errno!(
                CryptoStatus::InvalidModePaddingCombination,
                "SM2 needs at least one byte of plaintext"
            );
        }
        let evp_ctx = EvpPkeyCtxWapper::new(&self.public_key)?;
        unsafe {
            if EVP_PKEY_encrypt_init(evp_ctx.as_ptr()) != 1 {
                return Err(openssl_failure("EVP_PKEY_encrypt_init error"));
            }
            let mut ciphertext_len: size_t = 0;
            // get length
            if EVP_PKEY_encrypt(
                evp_ctx.as_ptr(),
                ptr::null_mut(),
                &mut ciphertext_len as *mut size_t,
                data.as_ptr(),
                data.len(),
            ) <= 0
            {
                return Err(openssl_failure("EVP_PKEY_encrypt failed"));
            }
            // the cipher_text size should be defined after length initialization
            let mut cipher_text = vec![0u8; ciphertext_len];
            if EVP_PKEY_encrypt(
                evp_ctx.as_ptr(),
                cipher_text.as_mut_ptr(),
                &mut ciphertext_len as *mut size_t,
                data.as_ptr(),
                data.len(),
            ) <= 0
            {
                return Err(openssl_failure("EVP_PKEY_encrypt failed"));
            }
            cipher_text.truncate(ciphertext_len);
            debug!("sm2 encrypt {} bytes", data.len());
            Ok(cipher_text)
        }
    }
}

pub struct Sm2Decrypter {
    private_key: Sm2Key,
}

impl Sm2Decrypter {
    pub fn from_key(key: &KeyMaterial) -> CryptoResult<Sm2Decrypter> {
        key.expect_algorithm(KeyAlgorithm::Sm2)?;
        Ok(Sm2Decrypter {
            private_key: Sm2Key::private_key_from_der(key.private_der_bytes()?)?,
        })
    }
}

impl Decrypter for Sm2Decrypter {
    /// Takes the DER `SM2Cipher` structure.
    ///
    /// OpenSSL documentation at [`EVP_PKEY_decrypt`].
    ///
    /// [`EVP_PKEY_decrypt`]: https://www.openssl.org/docs/manmaster/man3/EVP_PKEY_decrypt.html
    fn decrypt(&self, data: &[u8]) -> CryptoResult<Vec<u8>> {
        let evp_ctx = EvpPkeyCtxWapper::new(&self.private_key)?;
        unsafe {
            if EVP_PKEY_decrypt_init(evp_ctx.as_ptr()) != 1 {
                return Err(openssl_failure("EVP_PKEY_decrypt_init error"));
            }
            let mut plaintext_len: size_t = 0;
            // get length
            if EVP_PKEY_decrypt(
                evp_ctx.as_ptr(),
                ptr::null_mut(),
                &mut plaintext_len as *mut size_t,
                data.as_ptr(),
                data.len(),
            ) <= 0
            {
                return Err(openssl_failure("EVP_PKEY_decrypt failed"));
            }
            let mut plaintext = vec![0u8; plaintext_len];
            if EVP_PKEY_decrypt(
                evp_ctx.as_ptr(),
                plaintext.as_mut_ptr(),
                &mut plaintext_len as *mut size_t,
                data.as_ptr(),
                data.len(),
            ) <= 0
            {
                return Err(openssl_failure("EVP_PKEY_decrypt failed"));
            }
            plaintext.truncate(plaintext_len);
            Ok(plaintext)
        }
    }
}

pub struct Sm2Signer {
    private_key: Sm2Key,
    id: Vec<u8>,
}

impl Sm2Signer {
    pub fn from_key(key: &KeyMaterial) -> CryptoResult<Sm2Signer> {
        key.expect_algorithm(KeyAlgorithm::Sm2)?;
        Ok(Sm2Signer {
            private_key: Sm2Key::private_key_from_der(key.private_der_bytes()?)?,
            id: SM2_ID_DEFAULT.as_bytes().to_vec(),
        })
    }

    pub fn with_id(mut self, id: &[u8]) -> Self {
        self.id = id.to_vec();
        self
    }
}

impl Signer for Sm2Signer {
    /// SM3withSM2, DER encoded.
    ///
    /// OpenSSL documentation at [`EVP_DigestSignInit`].
    ///
    /// [`EVP_DigestSignInit`]: https://www.openssl.org/docs/manmaster/man3/EVP_DigestSignInit.html
    fn sign(&self, data: &[u8]) -> CryptoResult<Vec<u8>> {
        let ctx = self.private_key.digest_ctx(&self.id, true)?;
        unsafe {
            if EVP_DigestUpdate(ctx.as_ptr(), data.as_ptr() as *const _, data.len()) <= 0 {
                return Err(openssl_failure("EVP_DigestUpdate failed"));
            }
            let mut len = 0;
            if EVP_DigestSignFinal(ctx.as_ptr(), ptr::null_mut(), &mut len) <= 0 {
                return Err(openssl_failure("EVP_DigestSignFinal failed"));
            }
            let mut sig = vec![0u8; len];
            if EVP_DigestSignFinal(ctx.as_ptr(), sig.as_mut_ptr(), &mut len) <= 0 {
                return Err(openssl_failure("EVP_DigestSignFinal failed"));
            }
            sig.truncate(len);
            Ok(sig)
        }
    }
}

pub struct Sm2Verifier {
    public_key: Sm2Key,
    id: Vec<u8>,
}

impl Sm2Verifier {
    pub fn from_key(key: &KeyMaterial) -> CryptoResult<Sm2Verifier> {
        key.expect_algorithm(KeyAlgorithm::Sm2)?;
        Ok(Sm2Verifier {
            public_key: Sm2Key::public_key_from_der(key.public_der_bytes()?)?,
            id: SM2_ID_DEFAULT.as_bytes().to_vec(),
        })
    }

    pub fn with_id(mut self, id: &[u8]) -> Self {
        self.id = id.to_vec();
        self
    }
}

impl Verifier for Sm2Verifier {
    /// OpenSSL documentation at [`EVP_DigestVerifyInit`].
    ///
    /// [`EVP_DigestVerifyInit`]: https://www.openssl.org/docs/manmaster/man3/EVP_DigestVerifyInit.html
    fn verify(&self, data: &[u8], signature: &[u8]) -> CryptoResult<bool> {
        let ctx = self.public_key.digest_ctx(&self.id, false)?;
        unsafe {
            if EVP_DigestUpdate(ctx.as_ptr(), data.as_ptr() as *const _, data.len()) <= 0 {
                return Err(openssl_failure("EVP_DigestUpdate failed"));
            }
            let r = EVP_DigestVerifyFinal(ctx.as_ptr(), signature.as_ptr() as *mut _, signature.len());
            if r != 1 {
                // a negative value means the signature did not parse
                let stack = openssl::error::ErrorStack::get();
                debug!("sm2 signature rejected ({}): {}", r, stack);
            }
            Ok(r == 1)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::provider;
    use crate::utils::crypto::ec_codec;
    use crate::utils::crypto::key;
    use crate::utils::crypto::scheme::Sm2Mode;

    #[test]
    fn sm2_encrypt_decrypt() {
        provider::init();
        let pair = key::generate_sm2().unwrap();
        let encrypter = Sm2Encrypter::from_key(&pair.public_key).unwrap();
        let decrypter = Sm2Decrypter::from_key(&pair.private_key).unwrap();
        for plaintext in [&b"h"[..], &[0x5au8; 1000][..]] {
            let der = encrypter.encrypt(plaintext).unwrap();
            let flat = ec_codec::der_to_flat(&der, Sm2Mode::C1C2C3).unwrap();
            assert_eq!(flat.len(), 65 + plaintext.len() + 32);
            assert_eq!(decrypter.decrypt(&der).unwrap(), plaintext);
        }
        let err = encrypter.encrypt(b"").unwrap_err();
        assert_eq!(err.errno(), CryptoStatus::InvalidModePaddingCombination);
    }

    #[test]
    fn sm2_sign_verify_with_ids() {
        provider::init();
        let pair = key::generate_sm2().unwrap();
        let buffer = "hello".as_bytes();
        let signer = Sm2Signer::from_key(&pair.private_key).unwrap();
        let verifier = Sm2Verifier::from_key(&pair.public_key).unwrap();
        let signature = signer.sign(buffer).unwrap();
        assert!(verifier.verify(buffer, &signature).unwrap());
        // the same signer can be used again
        let again = signer.sign(buffer).unwrap();
        assert!(verifier.verify(buffer, &again).unwrap());
        assert!(!verifier.verify(b"hellO", &signature).unwrap());
        assert!(!verifier.verify(buffer, b"garbage").unwrap());

        let other_id = Sm2Verifier::from_key(&pair.public_key)
            .unwrap()
            .with_id(b"ALICE123@YAHOO.COM");
        assert!(!other_id.verify(buffer, &signature).unwrap());
        let signature = Sm2Signer::from_key(&pair.private_key)
            .unwrap()
            .with_id(b"ALICE123@YAHOO.COM")
            .sign(buffer)
            .unwrap();
        assert!(other_id.verify(buffer, &signature).unwrap());
    }

    #[test]
    fn garbage_key_is_a_key_format_error() {
        provider::init();
        let err = Sm2Key::public_key_from_der(b"not a key").err().unwrap();
        assert_eq!(err.errno(), CryptoStatus::InvalidKeyFormat);
        // the native error queue travels with the error
        assert!(err.get_cause().is_some());
        let err = Sm2Key::private_key_from_der(&[]).err().unwrap();
        assert_eq!(err.errno(), CryptoStatus::InvalidKeyFormat);
    }
}
