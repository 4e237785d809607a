//! One-shot generator for the policy validation circuit's proving artifacts.
//!
//! Writes three files into the output directory:
//!   policy_validation.circuit.json  circuit manifest served to provers
//!   policy_validation.pk.bin        Groth16 proving key
//!   verification_key.json           verification key in verifier JSON form

use anyhow::{Context, Result};
use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::fs;
use std::path::{Path, PathBuf};
use zk_policy::constants::CircuitManifest;
use zk_policy::groth16::{serialize_pk, setup_policy_keys};
use zk_policy::proof::vk_to_json;

#[derive(Parser)]
struct Args {
    /// Directory the artifacts are written into.
    #[arg(long, default_value = "artifacts")]
    out_dir: PathBuf,

    /// Seed for reproducible keys. Omit to draw fresh entropy; real
    /// deployments would replace this with a proper ceremony.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("failed to create {}", args.out_dir.display()))?;

    let mut rng = match args.seed {
        Some(seed) => ChaCha20Rng::seed_from_u64(seed),
        None => ChaCha20Rng::from_entropy(),
    };

    let (pk, vk) = setup_policy_keys(&mut rng)?;

    let manifest = serde_json::to_vec_pretty(&CircuitManifest::builtin())
        .context("failed to encode circuit manifest")?;
    write_artifact(&args.out_dir, "policy_validation.circuit.json", &manifest)?;

    let pk_bytes = serialize_pk(&pk)?;
    write_artifact(&args.out_dir, "policy_validation.pk.bin", &pk_bytes)?;

    let vk_json = serde_json::to_vec_pretty(&vk_to_json(&vk))
        .context("failed to encode verification key")?;
    write_artifact(&args.out_dir, "verification_key.json", &vk_json)?;

    Ok(())
}

fn write_artifact(dir: &Path, name: &str, bytes: &[u8]) -> Result<()> {
    let path = dir.join(name);
    fs::write(&path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    println!("wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}
