//! Build-time hints for locating the FFmpeg libraries `ffmpeg-sys-next`
//! links against. Nothing here changes the build; it only warns.

use std::env;
use std::path::{Path, PathBuf};

const WATCHED_VARIABLES: [&str; 5] = [
    "FFMPEG_DIR",
    "PKG_CONFIG_PATH",
    "VCPKG_ROOT",
    "VCPKGRS_DYNAMIC",
    "VCPKGRS_TRIPLET",
];

const HOMEBREW_PKG_CONFIG: [&str; 2] = [
    "/opt/homebrew/opt/ffmpeg/lib/pkgconfig",
    "/usr/local/opt/ffmpeg/lib/pkgconfig",
];

fn main() {
    for variable in WATCHED_VARIABLES {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    if env::var_os("FFMPEG_DIR").is_some() {
        return;
    }

    match env::var("CARGO_CFG_TARGET_OS").unwrap_or_default().as_str() {
        "windows" => check_vcpkg(),
        "macos" => check_homebrew(),
        _ => {}
    }
}

fn check_vcpkg() {
    let Ok(vcpkg_root) = env::var("VCPKG_ROOT") else {
        println!(
            "cargo:warning=subburn: FFMPEG_DIR is not set. Install FFmpeg with vcpkg and set VCPKG_ROOT or FFMPEG_DIR."
        );
        return;
    };

    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    let installed: PathBuf = [vcpkg_root.as_str(), "installed", triplet.as_str()]
        .iter()
        .collect();

    if !installed.join("include").join("libavcodec").exists() {
        println!(
            "cargo:warning=subburn: no FFmpeg headers under {}; run `vcpkg install ffmpeg:{triplet}`.",
            installed.display(),
        );
        return;
    }

    println!(
        "cargo:warning=subburn: using vcpkg FFmpeg at {}; set FFMPEG_DIR to silence this.",
        installed.display(),
    );
    if env::var_os("VCPKGRS_DYNAMIC").is_none() {
        println!("cargo:warning=subburn: set VCPKGRS_DYNAMIC=1 for a dynamic vcpkg FFmpeg build.");
    }
}

fn check_homebrew() {
    let search_path = env::var("PKG_CONFIG_PATH").unwrap_or_default();
    let Some(keg) = HOMEBREW_PKG_CONFIG
        .iter()
        .map(Path::new)
        .find(|dir| dir.exists())
    else {
        return;
    };

    if !env::split_paths(&search_path).any(|dir| dir == keg) {
        println!(
            "cargo:warning=subburn: Homebrew FFmpeg found at {}; add it to PKG_CONFIG_PATH if linking fails.",
            keg.display(),
        );
    }
}
