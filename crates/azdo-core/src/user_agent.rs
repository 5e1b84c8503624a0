//! User agent sent with every Azure DevOps request.

use std::sync::RwLock;

const PRODUCT: &str = "AzureDevOps.MCP";

/// Process-wide user agent, extended once the MCP client identifies itself.
#[derive(Debug)]
pub struct UserAgent {
    value: RwLock<String>,
}

impl UserAgent {
    pub fn new(version: &str) -> Self {
        Self {
            value: RwLock::new(format!("{}/{} (local)", PRODUCT, version)),
        }
    }

    /// Current user agent string.
    pub fn get(&self) -> String {
        match self.value.read() {
            Ok(value) => value.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Append `MCPClient/<name>@<version>`. Only the first call has effect.
    pub fn append_client_info(&self, name: &str, version: &str) {
        let mut value = match self.value.write() {
            Ok(value) => value,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !value.contains(" MCPClient/") {
            value.push_str(&format!(" MCPClient/{}@{}", name, version));
        }
    }
}

impl Default for UserAgent {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_VERSION"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_user_agent() {
        assert_eq!(UserAgent::new("1.2.0").get(), "AzureDevOps.MCP/1.2.0 (local)");
    }

    #[test]
    fn test_client_info_appended_once() {
        let agent = UserAgent::new("1.2.0");
        agent.append_client_info("vscode", "1.99.0");
        agent.append_client_info("other", "2.0");
        assert_eq!(
            agent.get(),
            "AzureDevOps.MCP/1.2.0 (local) MCPClient/vscode@1.99.0"
        );
    }
}
