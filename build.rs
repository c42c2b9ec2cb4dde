use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs");
    println!("cargo:rustc-env=BOT_VERSION={}", version());
}

// 版本號：套件版本 + git describe，取不到 git 時只用套件版本
fn version() -> String {
    let version = env!("CARGO_PKG_VERSION").to_string();

    let output = Command::new("git").args(["describe", "--always"]).output();
    match output {
        Ok(output) if output.status.success() => {
            let describe = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if describe.is_empty() {
                version
            } else {
                format!("{}-{}", version, describe)
            }
        }
        Ok(output) => {
            println!(
                "cargo:warning=`git describe` exited with {}, using package version",
                output.status
            );
            version
        }
        Err(e) => {
            println!("cargo:warning=`git describe` failed: {}", e);
            version
        }
    }
}
