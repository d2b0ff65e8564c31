use super::Target;
use clockin_client::settings::Settings;

use crate::VERSION;

pub fn run(settings: &Settings, target: &Target) {
    let env_config_dir = std::env::var("CLOCKIN_CONFIG_DIR");

    let vars = format!(
        "VARS:\nCLOCKIN_CONFIG_DIR = {:?}",
        env_config_dir.unwrap_or("None".into())
    );
    println!("{vars}\n");

    let mut paths = String::from("PATHS:\n");
    paths.push_str(&format!("config_path: {:?}\n", Settings::config_file()));
    paths.push_str(&format!("session_path: {:?}\n", settings.session_path));
    paths.push_str(&format!("log_dir: {:?}", settings.log_dir));
    println!("{paths}\n");

    println!("ACCOUNT:");
    println!("Server: {}", settings.server_address);
    println!(
        "Employee: {}",
        settings
            .employee_id(target.employee.as_deref())
            .map(|x| x.to_string())
            .unwrap_or("Not configured".into())
    );
    println!(
        "Company: {}",
        settings
            .company(target.company.as_deref())
            .unwrap_or("None")
    );
    println!(
        "Auth: {}",
        settings
            .session()
            .map(|_| "Authenticated")
            .unwrap_or("Unauthenticated")
    );

    println!();
    println!("Version: {VERSION}");
}
