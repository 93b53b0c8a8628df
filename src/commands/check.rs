//! Check command implementation.
//!
//! Validates system requirements and configuration.

use crate::config::{validate_effective_config, Config};
use crate::process::{collect_pids, parse_uss_for_process};
use crate::startup_checks::validate_requirements;

/// Validates system requirements and configuration.
pub fn command_check(
    memory: bool,
    proc: bool,
    all: bool,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Herakles USS Feed - System Check");
    println!("===================================");

    let mut all_ok = true;
    let proc_root = config.proc_root();

    if proc || all {
        println!("\n📁 Checking {} filesystem...", proc_root.display());
        if proc_root.is_dir() {
            println!("   ✅ {} accessible", proc_root.display());

            let pids = collect_pids(&proc_root);
            if pids.is_empty() {
                println!("   ❌ Cannot read any process entries");
                all_ok = false;
            } else {
                println!("   ✅ Can enumerate {} processes", pids.len());
            }

            match validate_requirements(&proc_root) {
                Ok(()) => println!("   ✅ Runtime requirements satisfied"),
                Err(e) => {
                    println!("   ❌ {}", e);
                    all_ok = false;
                }
            }
        } else {
            println!("   ❌ {} not found", proc_root.display());
            all_ok = false;
        }
    }

    if memory || all {
        println!("\n💾 Checking memory map accessibility...");
        let test_pid = std::process::id();
        let test_path = proc_root.join(test_pid.to_string());

        if test_path.join("smaps_rollup").exists() {
            println!("   ✅ smaps_rollup available (fast path)");
        } else if test_path.join("smaps").exists() {
            println!("   ✅ smaps available (slow path)");
        } else {
            println!("   ❌ No memory maps accessible");
            all_ok = false;
        }

        match parse_uss_for_process(
            &test_path,
            &config.buffer_config(),
            config.prefer_smaps_rollup(),
        ) {
            Ok(uss) => {
                println!(
                    "   ✅ Memory parsing successful: USS={} KB ({} bytes)",
                    uss / 1024,
                    uss
                );
            }
            Err(e) => {
                println!("   ❌ Memory parsing failed: {}", e);
                all_ok = false;
            }
        }
    }

    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(_) => {
            println!("   ✅ Configuration is valid");
        }
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - system is ready");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review warnings");
        std::process::exit(1);
    }
}
