//! Icon and terminal font downloads into `~/.local/share/fonts`.
//!
//! Each family has a marker file checked before downloading, so re-runs
//! skip what is already present. A failed font is a warning, not a failure:
//! the desktop works without them, just with missing glyphs.

use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;

use anyhow::{bail, Context};

use crate::error::Result;
use crate::paths;
use crate::runner;
use crate::steps::RunContext;
use crate::ui;

/// Maximum download size (200 MB).
const MAX_DOWNLOAD_SIZE: u64 = 200 * 1024 * 1024;

#[derive(Clone, Copy)]
enum SourceKind {
    /// A single .ttf saved under the marker name.
    File,
    /// A nerd-fonts release zip; `.ttf` entries with this prefix are extracted.
    Zip { prefix: &'static str },
}

struct FontSource {
    name: &'static str,
    url: &'static str,
    /// File whose presence under the font dir marks the family as installed.
    marker: &'static str,
    kind: SourceKind,
}

const FONTS: &[FontSource] = &[
    FontSource {
        name: "Material Symbols Rounded",
        url: "https://github.com/google/material-design-icons/raw/master/variablefont/MaterialSymbolsRounded%5BFILL,GRAD,opsz,wght%5D.ttf",
        marker: "MaterialSymbolsRounded.ttf",
        kind: SourceKind::File,
    },
    FontSource {
        name: "Caskaydia Cove Nerd Font",
        url: "https://github.com/ryanoasis/nerd-fonts/releases/download/v3.3.0/CascadiaCode.zip",
        marker: "CaskaydiaCoveNerdFont-Regular.ttf",
        kind: SourceKind::Zip { prefix: "CaskaydiaCoveNerdFont" },
    },
    FontSource {
        name: "JetBrains Mono Nerd Font",
        url: "https://github.com/ryanoasis/nerd-fonts/releases/download/v3.3.0/JetBrainsMono.zip",
        marker: "JetBrainsMonoNerdFont-Regular.ttf",
        kind: SourceKind::Zip { prefix: "JetBrainsMonoNerdFont" },
    },
];

pub fn install_all(ctx: &mut RunContext) -> Result<()> {
    if !ctx.config.fonts.install {
        ui::info("Font installation disabled in the config, skipping");
        return Ok(());
    }

    let font_dir = paths::fonts_dir()?;

    if ctx.opts.dry_run {
        ui::info(&format!(
            "Would download {} font families into {}",
            FONTS.len(),
            font_dir.display()
        ));
        return Ok(());
    }

    fs::create_dir_all(&font_dir)?;

    for font in FONTS {
        if font_dir.join(font.marker).exists() {
            ui::success(&format!("{} already installed", font.name));
            continue;
        }

        ui::info(&format!("Downloading {}...", font.name));
        match install_font(font, &font_dir) {
            Ok(()) => {
                ui::success(&format!("Installed {}", font.name));
                ctx.log.line(&format!("Installed font {}", font.name));
            }
            Err(e) => {
                ui::warn(&format!("Could not install {}: {e:#}", font.name));
                ctx.record_issue("fonts", format!("{}: {e:#}", font.name));
            }
        }
    }

    refresh_font_cache(ctx);
    Ok(())
}

fn install_font(font: &FontSource, font_dir: &Path) -> anyhow::Result<()> {
    let data = download(font.url)?;
    match font.kind {
        SourceKind::File => {
            fs::write(font_dir.join(font.marker), &data).context("Failed to write font file")?;
        }
        SourceKind::Zip { prefix } => {
            let count = extract_ttf(&data, prefix, font_dir)?;
            ui::dim(&format!("Extracted {count} font files"));
        }
    }
    Ok(())
}

fn download(url: &str) -> anyhow::Result<Vec<u8>> {
    let agent = ureq::Agent::new_with_defaults();

    let mut response = agent
        .get(url)
        .header("User-Agent", "caelestia-installer")
        .call()
        .context("Failed to download file")?;

    let bytes = response
        .body_mut()
        .with_config()
        .limit(MAX_DOWNLOAD_SIZE)
        .read_to_vec()
        .context("Failed to read response body")?;

    Ok(bytes)
}

/// Extract `.ttf` entries whose file name starts with `prefix` into `dest`.
/// Archive paths are flattened; nerd-fonts zips keep everything top-level
/// anyway.
fn extract_ttf(data: &[u8], prefix: &str, dest: &Path) -> anyhow::Result<usize> {
    let reader = Cursor::new(data);
    let mut archive = zip::ZipArchive::new(reader)?;

    let mut extracted = 0;
    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let name = file.name().to_string();
        let base = name.rsplit('/').next().unwrap_or(&name);
        if !base.starts_with(prefix) || !base.ends_with(".ttf") {
            continue;
        }

        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;
        fs::write(dest.join(base), &contents)?;
        extracted += 1;
    }

    if extracted == 0 {
        bail!("no {prefix}*.ttf entries in the archive");
    }
    Ok(extracted)
}

fn refresh_font_cache(ctx: &mut RunContext) {
    ui::info("Refreshing the font cache...");
    let ok = runner::capture(&mut ctx.log, "fc-cache", &["-f"])
        .map(|out| out.success())
        .unwrap_or(false);
    if !ok {
        ui::warn("fc-cache failed, new fonts may need a re-login to show up");
    }
}
