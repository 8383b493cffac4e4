//! Provider preamble placed at the top of an export document.

use crate::config::ExportConfig;
use crate::hcl::{Block, Expr};

/// Name of the variable the provider reads its API key from.
pub const API_KEY_VARIABLE: &str = "PERMIT_API_KEY";

/// Render the `terraform`, `variable` and `provider` blocks.
pub fn preamble(config: &ExportConfig) -> String {
    let terraform = Block::new("terraform").block(Block::new("required_providers").attribute(
        "permitio",
        Expr::Object(vec![
            ("source".to_string(), Expr::string(&config.provider_source)),
            ("version".to_string(), Expr::string(&config.provider_version)),
        ]),
    ));

    let variable = Block::new("variable")
        .label(API_KEY_VARIABLE)
        .attribute("type", Expr::traversal("string"))
        .attribute("description", Expr::string("The API key for the Permit.io API"))
        .attribute("sensitive", Expr::traversal("true"));

    let provider = Block::new("provider")
        .label("permitio")
        .attribute("api_url", Expr::string(&config.api_url))
        .attribute("api_key", Expr::traversal(format!("var.{}", API_KEY_VARIABLE)));

    [terraform, variable, provider]
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
