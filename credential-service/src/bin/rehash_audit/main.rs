use std::io;
use std::io::BufRead;
use std::io::Write;

use credential_service::audit;
use credential_service::audit::AuditSummary;
use credential_service::audit::HashVerdict;
use credential_service::config::Config;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Reads stored password hashes (one per line) from stdin and reports which
/// ones were produced under parameters other than the configured policy.
///
/// Output lines are `<line number>\t<current|rehash|malformed>`. Exits with status 1
/// when any hash is malformed.
fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "credential_service=info,rehash_audit=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    tracing::info!(
        service = "rehash-audit",
        version = env!("CARGO_PKG_VERSION"),
        "Audit starting"
    );

    let config = Config::load()?;
    let hasher = config.password_hasher()?;

    tracing::info!(
        memory_kib = config.hashing.memory_kib,
        iterations = config.hashing.iterations,
        parallelism = config.hashing.parallelism,
        output_len = config.hashing.output_len,
        salt_len = config.hashing.salt_len,
        max_memory_kib = hasher.limits().max_memory_kib,
        "Configuration loaded"
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    let mut summary = AuditSummary::default();

    for (index, line) in stdin.lock().lines().enumerate() {
        let line = line?;
        let encoded = line.trim();
        if encoded.is_empty() {
            continue;
        }

        let verdict = audit::classify(&hasher, encoded);
        if let HashVerdict::Malformed(e) = &verdict {
            tracing::warn!(line = index + 1, error = %e, "Malformed hash");
        }
        summary.record(&verdict);
        writeln!(stdout, "{}\t{}", index + 1, verdict)?;
    }

    tracing::info!(
        current = summary.current,
        rehash = summary.rehash,
        malformed = summary.malformed,
        "Audit finished"
    );

    let code = summary.exit_code();
    if code != 0 {
        std::process::exit(code);
    }

    Ok(())
}
