use agentic::server::{build_store, environment_name, load_config, validate_production_config};
use agentic::server::config::{AppConfig, ConversationBackend};
use std::path::Path;
use std::process::Command;

pub async fn run() -> anyhow::Result<()> {
    println!("🏥 Agentic Doctor\n");

    print!("Loading configuration... ");
    let config = match load_config() {
        Ok(config) => {
            println!("✅ ({})", environment_name());
            config
        }
        Err(e) => {
            println!("❌ {e:#}");
            std::process::exit(1);
        }
    };

    let mut all_ok = true;
    all_ok &= check_env_file();
    all_ok &= check_llm_config(&config);
    all_ok &= check_conversation_store(&config).await;
    all_ok &= check_renderer(&config);
    check_search(&config);

    println!();
    if all_ok {
        println!("✅ All checks passed! Ready to run Agentic.");
    } else {
        println!("⚠️  Some checks failed. Please fix the issues above.");
        std::process::exit(1);
    }

    Ok(())
}

fn check_env_file() -> bool {
    print!("Checking .env file... ");
    if Path::new(".env").exists() {
        println!("✅ Found");
    } else {
        println!("ℹ️  Not found (environment variables only)");
    }
    true
}

fn check_llm_config(config: &AppConfig) -> bool {
    print!("Checking LLM configuration... ");
    match validate_production_config(config) {
        Ok(()) => {
            println!(
                "✅ {} ({} / {})",
                config.llm.base_url, config.llm.lightweight_model, config.llm.high_performance_model
            );
            true
        }
        Err(e) => {
            println!("❌ {e}");
            false
        }
    }
}

async fn check_conversation_store(config: &AppConfig) -> bool {
    print!("Checking conversation store... ");
    let handles = match build_store(config) {
        Ok(handles) => handles,
        Err(e) => {
            println!("❌ {e:#}");
            return false;
        }
    };

    match config.conversation.backend {
        ConversationBackend::Memory => {
            println!("ℹ️  In-memory (conversations are lost on restart)");
            true
        }
        ConversationBackend::Redis => match handles.store.find_active("__doctor__").await {
            Ok(_) => {
                println!("✅ Redis reachable");
                true
            }
            Err(e) => {
                println!("⚠️  Redis check failed: {e}");
                false
            }
        },
    }
}

fn check_renderer(config: &AppConfig) -> bool {
    print!("Checking PDF renderer... ");
    match Command::new(&config.renderer.command).arg("--version").output() {
        Ok(output) => {
            let version = String::from_utf8_lossy(&output.stdout);
            println!("✅ {}", version.trim());
            true
        }
        Err(_) => {
            println!(
                "❌ '{}' not found. Document generation will fail.",
                config.renderer.command
            );
            false
        }
    }
}

fn check_search(config: &AppConfig) {
    print!("Checking search keys... ");
    let kakao = !config.integrations.kakao_api_key.trim().is_empty();
    let google = !config.integrations.google_api_key.trim().is_empty()
        && !config.integrations.google_cx.trim().is_empty();
    match (kakao, google) {
        (true, true) => println!("✅ Kakao and Google"),
        (true, false) => println!("✅ Kakao (web search falls back to Kakao)"),
        (false, true) => println!("⚠️  Google only (location lookups disabled)"),
        (false, false) => println!("⚠️  None (event, job and location lookups disabled)"),
    }
}
