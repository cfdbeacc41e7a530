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

mod config;

use std::str::FromStr;

use cipher_facade::utils::crypto::key;
use cipher_facade::{
    Algorithm, AlgorithmSpec, CipherFacade, KeyEncoding, KeyMaterial, SignatureAlgorithm, Sm2Mode,
};
use cipher_types::*;
use config::{CipherArgs, Command, LogConfig};
use log::{error, info, LevelFilter};

// init log
fn init_log(log_config: &LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    use log4rs::append::console::{ConsoleAppender, Target};
    use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
    use log4rs::append::rolling_file::policy::compound::trigger::size::SizeTrigger;
    use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
    use log4rs::append::rolling_file::RollingFileAppender;
    use log4rs::config::{Appender, Config, Root};
    use log4rs::encode::pattern::PatternEncoder;

    let log_level = match log_config.log_level.as_deref() {
        Some("debug") => LevelFilter::Debug,
        Some("info") => LevelFilter::Info,
        Some("warn") => LevelFilter::Warn,
        Some("error") => LevelFilter::Error,
        _ => LevelFilter::Debug,
    };
    let log_file_name = log_config
        .log_file_name
        .clone()
        .unwrap_or_else(|| "cipher-facade.log".to_owned());

    // stdout carries command output
    let console = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("[{d}] [{t}] [{l}] {m}{n}")))
        .build();

    let fixed_window_roller = FixedWindowRoller::builder().build(
        &(log_file_name.clone() + ".{}"),
        log_config.log_window_size.unwrap_or(10),
    )?;
    let size_trigger = SizeTrigger::new(log_config.log_size_limit.unwrap_or(100) * 1024 * 1024);
    let compound_policy =
        CompoundPolicy::new(Box::new(size_trigger), Box::new(fixed_window_roller));
    let facade_log = RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new("[{d}] [{t}] [{l}] {m}{n}")))
        .build(&log_file_name, Box::new(compound_policy))?;

    let mut root_builder = Root::builder().appender("facade_log");
    if log_config.enable_console_logger.unwrap_or(false) {
        root_builder = root_builder.appender("console");
    }

    let config = Config::builder()
        .appender(Appender::builder().build("console", Box::new(console)))
        .appender(Appender::builder().build("facade_log", Box::new(facade_log)))
        .build(root_builder.build(log_level))?;

    log4rs::init_config(config)?;
    Ok(())
}

// PEM text or Base64 DER
fn read_key(text: &str, encoding: KeyEncoding) -> CryptoResult<KeyMaterial> {
    if text.trim_start().starts_with("-----BEGIN") {
        KeyMaterial::from_pem(text)
    } else {
        KeyMaterial::from_base64(text, encoding)
    }
}

fn read_iv(args: &CipherArgs) -> CryptoResult<Option<Vec<u8>>> {
    match (&args.iv, &args.iv_hex) {
        (Some(_), Some(_)) => Err(errno!(
            CryptoStatus::InvalidArgument,
            "--iv and --iv_hex are exclusive"
        )),
        (Some(iv), None) => Ok(Some(iv.as_bytes().to_vec())),
        (None, Some(iv_hex)) => hex::decode(iv_hex).map(Some).map_err(|e| {
            errno!(CryptoStatus::InvalidArgument, "iv is not hex: {}", e).with_cause(e)
        }),
        (None, None) => Ok(None),
    }
}

fn cipher_key(spec: &AlgorithmSpec, text: &str, encrypt: bool) -> CryptoResult<KeyMaterial> {
    match (spec.algorithm(), encrypt) {
        (Algorithm::Rsa | Algorithm::Sm2, true) => read_key(text, KeyEncoding::X509Public),
        (Algorithm::Rsa | Algorithm::Sm2, false) => read_key(text, KeyEncoding::Pkcs8Private),
        _ => KeyMaterial::from_base64(text, KeyEncoding::Raw),
    }
}

fn run(cfg: &config::Config, command: Command) -> CryptoResult<bool> {
    let sm2_mode = Sm2Mode::from_str(cfg.sm2_mode.as_deref().unwrap_or("C1C2C3"))?;
    let mut facade = CipherFacade::new().with_sm2_mode(sm2_mode);
    if let Some(sm2_id) = &cfg.sm2_id {
        facade = facade.with_sm2_id(sm2_id.as_bytes());
    }
    let transformation = cfg.transformation.as_deref().unwrap_or("AES/CBC/PKCS5Padding");
    let signature_algorithm = cfg.signature_algorithm.as_deref().unwrap_or("SHA256withRSA");

    match command {
        Command::Encrypt(args) => {
            let spec = AlgorithmSpec::from_str(transformation)?;
            let key = cipher_key(&spec, &args.key, true)?;
            let iv = read_iv(&args)?;
            info!("encrypt with {}", spec);
            println!(
                "{}",
                facade.encrypt_base64(&spec, &key, iv.as_deref(), &args.data)?
            );
        }
        Command::Decrypt(args) => {
            let spec = AlgorithmSpec::from_str(transformation)?;
            let key = cipher_key(&spec, &args.key, false)?;
            let iv = read_iv(&args)?;
            info!("decrypt with {}", spec);
            println!(
                "{}",
                facade.decrypt_str(&spec, &key, iv.as_deref(), &args.data)?
            );
        }
        Command::Sign(args) => {
            let algorithm = SignatureAlgorithm::from_str(signature_algorithm)?;
            let key = read_key(&args.key, KeyEncoding::Pkcs8Private)?;
            info!("sign with {}", algorithm);
            let signature = if args.raw {
                let raw = facade.sign_raw(algorithm, args.data.as_bytes(), &key)?;
                cipher_facade::utils::base64_encode(&raw)
            } else {
                facade.sign_base64(algorithm, &args.data, &key)?
            };
            println!("{}", signature);
        }
        Command::Verify(args) => {
            let algorithm = SignatureAlgorithm::from_str(signature_algorithm)?;
            let key = read_key(&args.key, KeyEncoding::X509Public)?;
            info!("verify with {}", algorithm);
            let valid = if args.raw {
                facade.verify_raw_base64(algorithm, &args.data, &key, &args.signature)?
            } else {
                facade.verify_base64(algorithm, &args.data, &key, &args.signature)?
            };
            println!("{}", valid);
            return Ok(valid);
        }
        Command::Genkey(args) => {
            let pair = match args.algorithm.to_uppercase().as_str() {
                "RSA" => key::generate_rsa(args.bits)?,
                "SM2" => key::generate_sm2()?,
                "EC" => key::generate_ec_p256()?,
                other => return_errno!(
                    CryptoStatus::UnsupportedAlgorithm,
                    "cannot generate {} keys",
                    other
                ),
            };
            info!("generated {} key pair", args.algorithm);
            println!("public_key: {}", pair.public_key.to_base64());
            println!("private_key: {}", pair.private_key.to_base64());
        }
        Command::InspectKey(args) => {
            let encoding = if args.private {
                KeyEncoding::Pkcs8Private
            } else {
                KeyEncoding::X509Public
            };
            let key = read_key(&args.key, encoding)?;
            println!("{}", key.algorithm()?);
        }
    }
    Ok(true)
}

fn main() {
    // Parse whole args with clap
    let (cfg, command) = match config::Config::new() {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(map_status_to_i32(e.errno()));
        }
    };

    // init log
    if let Err(e) = init_log(&cfg.log_config) {
        eprintln!("failed to init log: {}", e);
        std::process::exit(map_status_to_i32(CryptoStatus::InternalErr));
    }

    match run(&cfg, command) {
        Ok(true) => {}
        // a signature that did not verify
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("{}", e);
            eprintln!("{}: {}", e.errno(), e.message());
            std::process::exit(map_status_to_i32(e.errno()));
        }
    }
}
