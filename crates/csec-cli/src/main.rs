//! csec: command-line front end for the csec primitives
//!
//! Commands:
//!   digest [FILE]             - hash a file or stdin, print hex
//!   hmac --key-hex K [FILE]   - MAC a file or stdin, print hex
//!   encrypt / decrypt         - stream a file or stdin through a cryptor
//!   derive --salt-hex S       - PBKDF2 key derivation, print hex
//!   calibrate                 - PBKDF2 round count for a target duration
//!   random <N>                - N random bytes as hex
//!   config show               - display current configuration

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use secrecy::{ExposeSecret, SecretString};
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use zeroize::Zeroizing;

use csec_core::config::CsecConfig;
use csec_core::{CipherAlgorithm, CryptorOptions, HashAlgorithm, Operation};
use csec_crypto::{CalibrationParams, Cryptor, Digester, Hmac};

const READ_BUF_SIZE: usize = 64 * 1024;

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "csec",
    version,
    about = "Streaming digests, MACs, ciphers, and key derivation",
    long_about = "csec: hash, authenticate, encrypt, and derive keys over files or stdin"
)]
struct Cli {
    /// Path to csec.toml configuration file (defaults apply when omitted)
    #[arg(long, short = 'c', env = "CSEC_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, env = "CSEC_LOG")]
    log: Option<String>,

    /// Log format (json, text); overrides the config file
    #[arg(long, env = "CSEC_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, ValueEnum, PartialEq)]
enum LogFormat {
    Json,
    Text,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Hash a file (or stdin) and print the digest as hex
    Digest {
        /// Hash algorithm (default: from config)
        #[arg(long, short = 'a')]
        algorithm: Option<HashAlgorithm>,
        /// Input file; stdin when omitted or "-"
        input: Option<PathBuf>,
    },

    /// Compute an HMAC over a file (or stdin) and print it as hex
    Hmac {
        /// Hash algorithm (default: from config)
        #[arg(long, short = 'a')]
        algorithm: Option<HashAlgorithm>,
        #[command(flatten)]
        key: KeyArgs,
        /// Input file; stdin when omitted or "-"
        input: Option<PathBuf>,
    },

    /// Encrypt a file (or stdin) to a file (or stdout)
    Encrypt(CipherArgs),

    /// Decrypt a file (or stdin) to a file (or stdout)
    Decrypt(CipherArgs),

    /// Derive a key with PBKDF2 and print it as hex
    ///
    /// The password is taken from --password, the CSEC_PASSWORD environment
    /// variable, or an interactive prompt, in that order.
    Derive {
        /// PRF hash algorithm (default: from config)
        #[arg(long, short = 'a')]
        algorithm: Option<HashAlgorithm>,
        /// Salt as hex
        #[arg(long)]
        salt_hex: String,
        /// Round count (default: from config)
        #[arg(long, short = 'r')]
        rounds: Option<u32>,
        /// Derived key size in bytes (default: from config)
        #[arg(long, short = 'k')]
        key_size: Option<usize>,
        /// Password; prefer CSEC_PASSWORD or the prompt over shell history
        #[arg(long, env = "CSEC_PASSWORD", hide_env_values = true, value_parser = parse_secret)]
        password: Option<SecretString>,
    },

    /// Estimate the PBKDF2 round count that takes a target duration
    Calibrate {
        /// PRF hash algorithm (default: from config)
        #[arg(long, short = 'a')]
        algorithm: Option<HashAlgorithm>,
        /// Target duration in milliseconds (default: from config)
        #[arg(long, short = 't')]
        target_ms: Option<u64>,
        /// Derived key size in bytes (default: from config)
        #[arg(long, short = 'k')]
        key_size: Option<usize>,
    },

    /// Print random bytes from the OS generator as hex
    Random {
        /// Number of bytes
        size: usize,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

#[derive(Args, Debug)]
struct KeyArgs {
    /// Key as hex
    #[arg(long, conflicts_with = "key_file", required_unless_present = "key_file")]
    key_hex: Option<String>,
    /// Read raw key bytes from a file
    #[arg(long)]
    key_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct CipherArgs {
    /// Cipher algorithm (default: from config)
    #[arg(long, short = 'a')]
    algorithm: Option<CipherAlgorithm>,
    #[command(flatten)]
    key: KeyArgs,
    /// IV as hex, exactly one block; all zeros when omitted
    #[arg(long)]
    iv_hex: Option<String>,
    /// Disable PKCS#7 padding
    #[arg(long)]
    no_padding: bool,
    /// Electronic codebook mode (no IV chaining)
    #[arg(long)]
    ecb: bool,
    /// Input file; stdin when omitted or "-"
    #[arg(long, short = 'i')]
    input: Option<PathBuf>,
    /// Output file; stdout when omitted or "-"
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
}

/// Wrap a secret argument as soon as clap hands it over.
fn parse_secret(value: &str) -> Result<SecretString, std::convert::Infallible> {
    Ok(SecretString::from(value))
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    let level = cli
        .log
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    let format = match &cli.log_format {
        Some(format) => format.clone(),
        None => LogFormat::from_str(&config.logging.format, true)
            .map_err(|e| anyhow::anyhow!("invalid logging.format in config: {e}"))?,
    };
    init_logging(&level, &format);

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?cli.config,
        "csec starting"
    );

    match cli.command {
        Commands::Digest { algorithm, input } => cmd_digest(&config, algorithm, input.as_deref()),
        Commands::Hmac {
            algorithm,
            key,
            input,
        } => cmd_hmac(&config, algorithm, &key, input.as_deref()),
        Commands::Encrypt(args) => cmd_crypt(&config, Operation::Encrypt, &args),
        Commands::Decrypt(args) => cmd_crypt(&config, Operation::Decrypt, &args),
        Commands::Derive {
            algorithm,
            salt_hex,
            rounds,
            key_size,
            password,
        } => cmd_derive(&config, algorithm, &salt_hex, rounds, key_size, password),
        Commands::Calibrate {
            algorithm,
            target_ms,
            key_size,
        } => cmd_calibrate(&config, algorithm, target_ms, key_size),
        Commands::Random { size } => cmd_random(size),
        Commands::Config {
            action: ConfigAction::Show,
        } => cmd_config_show(&config, cli.config.as_deref()),
    }
}

// ── Config + logging ──────────────────────────────────────────────────────────

fn load_config(path: Option<&Path>) -> Result<CsecConfig> {
    match path {
        Some(path) => CsecConfig::load(path)
            .with_context(|| format!("loading config: {}", path.display())),
        None => Ok(CsecConfig::default()),
    }
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // logs go to stderr so stdout stays clean for output data
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(io::stderr))
                .init();
        }
    }
}

// ── I/O helpers ───────────────────────────────────────────────────────────────

fn is_stdio(path: Option<&Path>) -> bool {
    path.map_or(true, |p| p.as_os_str() == "-")
}

fn open_input(path: Option<&Path>) -> Result<Box<dyn Read>> {
    match path {
        Some(p) if !is_stdio(path) => {
            let file = File::open(p).with_context(|| format!("opening input: {}", p.display()))?;
            Ok(Box::new(file))
        }
        _ => Ok(Box::new(io::stdin().lock())),
    }
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(p) if !is_stdio(path) => {
            let file =
                File::create(p).with_context(|| format!("creating output: {}", p.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        _ => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}

/// Feed `reader` to `sink` in fixed-size reads. Returns the byte count.
fn pump<R, F>(mut reader: R, mut sink: F) -> Result<u64>
where
    R: Read,
    F: FnMut(&[u8]) -> Result<()>,
{
    let mut buf = vec![0u8; READ_BUF_SIZE];
    let mut total = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e).context("reading input"),
        };
        sink(&buf[..n])?;
        total += n as u64;
    }
    Ok(total)
}

fn load_key(args: &KeyArgs) -> Result<Zeroizing<Vec<u8>>> {
    match (&args.key_hex, &args.key_file) {
        (Some(hex_key), _) => Ok(Zeroizing::new(
            hex::decode(hex_key.trim()).context("decoding --key-hex")?,
        )),
        (None, Some(path)) => Ok(Zeroizing::new(
            std::fs::read(path).with_context(|| format!("reading key file: {}", path.display()))?,
        )),
        (None, None) => anyhow::bail!("one of --key-hex or --key-file is required"),
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn digest_stream<R: Read>(algorithm: HashAlgorithm, reader: R) -> Result<Vec<u8>> {
    let mut digester = Digester::new(algorithm)?;
    let total = pump(reader, |chunk| {
        digester.update(chunk)?;
        Ok(())
    })?;
    tracing::debug!(%algorithm, bytes = total, "digest complete");
    Ok(digester.finalize()?)
}

fn cmd_digest(
    config: &CsecConfig,
    algorithm: Option<HashAlgorithm>,
    input: Option<&Path>,
) -> Result<()> {
    let algorithm = algorithm.unwrap_or(config.digest.algorithm);
    let digest = digest_stream(algorithm, open_input(input)?)?;
    println!("{}", hex::encode(digest));
    Ok(())
}

fn hmac_stream<R: Read>(algorithm: HashAlgorithm, key: &[u8], reader: R) -> Result<Vec<u8>> {
    let mut mac = Hmac::new(algorithm, key)?;
    pump(reader, |chunk| {
        mac.update(chunk)?;
        Ok(())
    })?;
    Ok(mac.finalize()?)
}

fn cmd_hmac(
    config: &CsecConfig,
    algorithm: Option<HashAlgorithm>,
    key: &KeyArgs,
    input: Option<&Path>,
) -> Result<()> {
    let algorithm = algorithm.unwrap_or(config.digest.algorithm);
    let key = load_key(key)?;
    let tag = hmac_stream(algorithm, &key, open_input(input)?)?;
    println!("{}", hex::encode(tag));
    Ok(())
}

/// Stream `reader` through `cryptor` into `writer`. Returns bytes written.
fn crypt_stream<R: Read, W: Write>(cryptor: &mut Cryptor, reader: R, mut writer: W) -> Result<u64> {
    let mut out = Zeroizing::new(Vec::new());
    let mut written = 0u64;

    pump(reader, |chunk| {
        let needed = cryptor.output_length(chunk.len(), false);
        if out.len() < needed {
            out.resize(needed, 0);
        }
        let n = cryptor.update_into(chunk, &mut out)?;
        writer.write_all(&out[..n]).context("writing output")?;
        written += n as u64;
        Ok(())
    })?;

    let needed = cryptor.output_length(0, true);
    if out.len() < needed {
        out.resize(needed, 0);
    }
    let n = cryptor.finalize_into(&mut out)?;
    writer.write_all(&out[..n]).context("writing output")?;
    writer.flush().context("flushing output")?;
    Ok(written + n as u64)
}

fn cmd_crypt(config: &CsecConfig, operation: Operation, args: &CipherArgs) -> Result<()> {
    let algorithm = args.algorithm.unwrap_or(config.cipher.algorithm);

    let mut options = CryptorOptions::empty();
    if config.cipher.pkcs7_padding && !args.no_padding {
        options |= CryptorOptions::PKCS7_PADDING;
    }
    if config.cipher.ecb_mode || args.ecb {
        options |= CryptorOptions::ECB_MODE;
    }

    let key = load_key(&args.key)?;
    let iv = match &args.iv_hex {
        Some(iv) => hex::decode(iv.trim()).context("decoding --iv-hex")?,
        None => Vec::new(),
    };

    let mut cryptor = Cryptor::new(operation, algorithm, options, &key, &iv)?;
    let reader = open_input(args.input.as_deref())?;
    let writer = open_output(args.output.as_deref())?;
    let written = crypt_stream(&mut cryptor, reader, writer)?;

    tracing::info!(%algorithm, ?operation, bytes = written, "cryptor finished");
    Ok(())
}

fn cmd_derive(
    config: &CsecConfig,
    algorithm: Option<HashAlgorithm>,
    salt_hex: &str,
    rounds: Option<u32>,
    key_size: Option<usize>,
    password: Option<SecretString>,
) -> Result<()> {
    let algorithm = algorithm.unwrap_or(config.pbkdf2.algorithm);
    let rounds = rounds.unwrap_or(config.pbkdf2.rounds);
    let key_size = key_size.unwrap_or(config.pbkdf2.key_size);
    let salt = hex::decode(salt_hex.trim()).context("decoding --salt-hex")?;

    let password = match password {
        Some(p) => p,
        None => SecretString::from(
            rpassword::prompt_password("Password: ").context("reading password")?,
        ),
    };

    let key = csec_crypto::derive_key(
        key_size,
        password.expose_secret().as_bytes(),
        &salt,
        rounds,
        algorithm,
    )?;
    println!("{}", hex::encode(key.as_bytes()));
    Ok(())
}

fn cmd_calibrate(
    config: &CsecConfig,
    algorithm: Option<HashAlgorithm>,
    target_ms: Option<u64>,
    key_size: Option<usize>,
) -> Result<()> {
    let cfg = &config.pbkdf2;
    let algorithm = algorithm.unwrap_or(cfg.algorithm);
    let target = Duration::from_millis(target_ms.unwrap_or(cfg.target_ms));
    let params = CalibrationParams {
        trial_rounds: cfg.trial_rounds,
        min_sample: Duration::from_millis(cfg.min_sample_ms),
    };

    let result = csec_crypto::calibrate_with(
        cfg.password_len,
        cfg.salt_len,
        key_size.unwrap_or(cfg.key_size),
        algorithm,
        target,
        &params,
    )?;
    tracing::info!(
        sample_rounds = result.sample_rounds,
        sample_ms = result.sample_elapsed.as_millis() as u64,
        "calibration sample"
    );
    println!("{}", result.rounds);
    Ok(())
}

fn cmd_random(size: usize) -> Result<()> {
    let bytes = csec_crypto::generate_bytes(size)?;
    println!("{}", hex::encode(bytes));
    Ok(())
}

fn cmd_config_show(config: &CsecConfig, config_path: Option<&Path>) -> Result<()> {
    match config_path {
        Some(path) if path.exists() => println!("# Configuration from: {}", path.display()),
        Some(path) => println!("# Configuration: defaults (no file at {})", path.display()),
        None => println!("# Configuration: defaults"),
    }
    println!();
    let rendered = toml::to_string_pretty(config).context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}
