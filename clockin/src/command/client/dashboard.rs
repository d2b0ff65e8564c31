use super::{connect, Target};
use clockin_client::settings::Settings;
use eyre::{eyre, Result};

pub async fn run(settings: &Settings, target: &Target) -> Result<()> {
    let (api, employee_id) = connect(settings, target)?;
    let res = api
        .dashboard(&employee_id)
        .await
        .map_err(|err| eyre!("{}", err.message()))?;

    println!("{}", serde_json::to_string_pretty(&res)?);
    Ok(())
}
