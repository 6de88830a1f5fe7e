use std::collections::BTreeMap;
use std::error::Error;

use env_logger::Env;
use ini_handler::{HandlerOptions, IniHandler};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    // Create example INI content
    let ini_content = r#"; service configuration
[General]
api_mode=false
api_access_token = password

[Proxy]
# upstream used for downloads
upstream = http://127.0.0.1:8080
"#;

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("service.ini");
    std::fs::write(&path, ini_content)?;

    let mut handler = IniHandler::new(HandlerOptions::default());

    // Update one value, comments and spacing stay as they are
    handler.set_single_value(&path, "General", "api_mode", "true", false)?;

    // Several values in one write, creating the section on the way
    let mut values = BTreeMap::new();
    values.insert("interval", "300");
    values.insert("url", "http://www.gstatic.com/generate_204");
    handler.set_multiple_values(&path, "Health Check", values, true)?;

    // Missing section without creatable is reported and leaves the file alone
    if let Err(e) = handler.set_single_value(&path, "Missing", "key", "value", false) {
        println!("Expected failure: {}", e);
    }

    let document = handler.read_document(&path)?;
    println!("Sections: {:?}", document.sections());
    println!("api_mode: {:?}", document.get_value("General", "api_mode"));
    println!("\nWritten INI:\n{}", document);

    Ok(())
}
