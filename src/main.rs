//! Host-side helper: `cargo run` packs the WASM module into `static/pkg` and
//! serves `static/` on localhost.

use std::env;
use std::process::{Command, ExitCode, Stdio};

const DEFAULT_PORT: u16 = 8000;

fn main() -> ExitCode {
    // Only meaningful on non-wasm targets.
    if cfg!(target_arch = "wasm32") {
        return ExitCode::SUCCESS;
    }

    let port = env::var("PORTFOLIO_FX_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);

    println!("Building WASM pkg …");
    match Command::new("wasm-pack")
        .args([
            "build",
            "--release",
            "--target",
            "web",
            "--out-dir",
            "static/pkg",
        ])
        .status()
    {
        Ok(st) if st.success() => {}
        Ok(_) => {
            eprintln!("wasm-pack finished with errors. Ensure wasm-pack is installed (https://rustwasm.github.io/wasm-pack/).");
            return ExitCode::FAILURE;
        }
        Err(_) => {
            eprintln!("wasm-pack not found in PATH. Skipping wasm build; the page may load a stale pkg.");
        }
    }

    println!("Serving static/ at http://127.0.0.1:{port} …");
    let server = Command::new("python3")
        .args(["-m", "http.server", &port.to_string(), "--directory", "static"])
        .stdout(Stdio::null())
        .stderr(Stdio::inherit())
        .spawn();
    let mut server = match server {
        Ok(child) => child,
        Err(e) => {
            eprintln!("failed to start http server: {e}");
            return ExitCode::FAILURE;
        }
    };

    match server.wait() {
        Ok(st) if st.success() => ExitCode::SUCCESS,
        Ok(st) => {
            eprintln!("http server exited with {st}");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("lost the http server: {e}");
            ExitCode::FAILURE
        }
    }
}
