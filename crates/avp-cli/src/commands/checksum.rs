//! Checksum command - compute a tracking number check character.

use clap::Args;

use avp_core::CheckScheme;

/// Arguments for the checksum command.
#[derive(Args)]
pub struct ChecksumArgs {
    /// 14-character payload
    payload: String,

    /// Check scheme (auto picks ISO 7064 for 869 payloads, La Poste otherwise)
    #[arg(short, long, value_enum, default_value = "auto")]
    scheme: SchemeArg,

    /// Print only the check character
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum SchemeArg {
    Auto,
    Iso,
    LaPoste,
}

pub async fn run(args: ChecksumArgs) -> anyhow::Result<()> {
    let payload = args.payload.trim().to_uppercase();

    if payload.chars().count() != 14 {
        anyhow::bail!(
            "Payload must be 14 characters, got {} ({})",
            payload.chars().count(),
            payload
        );
    }

    let scheme = match args.scheme {
        SchemeArg::Auto => CheckScheme::for_payload(&payload),
        SchemeArg::Iso => CheckScheme::Iso7064,
        SchemeArg::LaPoste => CheckScheme::LaPoste,
    };

    let key = scheme.key(&payload)?;

    if args.quiet {
        println!("{}", key);
    } else {
        println!("{}{}  ({:?})", payload, key, scheme);
    }

    Ok(())
}
