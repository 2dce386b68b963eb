//! `config init` / `config show`

use anyhow::Result;
use console::style;

use super::ConfigAction;
use crate::config::UserConfig;

pub fn run(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Init => {
            let path = UserConfig::init_user_config()?;
            println!("{} Config initialized at: {}", style("✓").green(), path.display());
            println!("\nEnvironment variables override the file:");
            println!("  PORT, HOST, VOICE_SERVICE_URL, CHROME_EXECUTABLE, SITESCOPE_AXE_URL");
            Ok(())
        }
        ConfigAction::Show => show_config(),
    }
}

fn show_config() -> Result<()> {
    let config = UserConfig::load()?;
    println!("{}", style("Config path").bold());
    if let Some(path) = UserConfig::user_config_path() {
        let status = if path.exists() { "✓" } else { "(not found)" };
        println!("  {} {}", path.display(), status);
    }
    println!();

    let audit = config.audit_settings();
    let browser = config.browser_settings();
    println!("{}", style("Server").bold());
    println!("  Listen:        {}:{}", config.host(), config.port());
    println!("  Voice service: {}", config.upstream_url());
    println!();
    println!("{}", style("Audit").bold());
    println!("  User agent:           {}", audit.user_agent);
    match audit.request_timeout {
        Some(t) => println!("  Request timeout:      {}s", t.as_secs()),
        None => println!("  Request timeout:      none"),
    }
    println!(
        "  Accessibility timeout: {}s",
        audit.accessibility_timeout.as_secs()
    );
    println!("  Max a11y issues:      {}", audit.max_accessibility_issues);
    println!("  axe-core:             {}", audit.axe_script_url);
    println!();
    println!("{}", style("Browser").bold());
    match &browser.executable {
        Some(exe) => println!("  Executable:  {}", exe.display()),
        None => println!("  Executable:  (auto-detect)"),
    }
    println!(
        "  Network idle: <= {} requests for {} ms",
        browser.idle_max_inflight,
        browser.idle_window.as_millis()
    );
    Ok(())
}
