//! Terraform variable generation
//!
//! Renders an environment snapshot as a `variable` block whose default value maps each
//! virtual network to its address space and subnets.

use ippool_core::{EnvironmentState, IpPoolError};
use std::fmt;

const VARIABLE_TYPE: &str = "map(object({
    address_space = string
    subnets = map(object({
      address_space = string
    }))
  }))";

/// Terraform text for `state`, declared as variable `variable_name`
pub fn generate_terraform(
    state: &EnvironmentState,
    variable_name: &str,
) -> ippool_core::Result<String> {
    if !is_identifier(variable_name) {
        return Err(IpPoolError::business(format!(
            "invalid variable name: {variable_name}"
        )));
    }
    Ok(TerraformVariable {
        state,
        name: variable_name,
    }
    .to_string())
}

struct TerraformVariable<'a> {
    state: &'a EnvironmentState,
    name: &'a str,
}

impl fmt::Display for TerraformVariable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# address space {}", self.state.address_space)?;
        writeln!(f, "variable \"{}\" {{", self.name)?;
        writeln!(f, "  type = {VARIABLE_TYPE}")?;
        if self.state.virtual_networks.is_empty() {
            writeln!(f, "  default = {{}}")?;
        } else {
            writeln!(f, "  default = {{")?;
            for (vnet_key, vnet) in &self.state.virtual_networks {
                writeln!(f, "    {} = {{", quote(vnet_key))?;
                writeln!(f, "      address_space = {}", quote(&vnet.address_space))?;
                if vnet.subnets.is_empty() {
                    writeln!(f, "      subnets = {{}}")?;
                } else {
                    writeln!(f, "      subnets = {{")?;
                    for (subnet_key, subnet) in &vnet.subnets {
                        writeln!(f, "        {} = {{", quote(subnet_key))?;
                        writeln!(f, "          address_space = {}", quote(&subnet.address_space))?;
                        writeln!(f, "        }}")?;
                    }
                    writeln!(f, "      }}")?;
                }
                writeln!(f, "    }}")?;
            }
            writeln!(f, "  }}")?;
        }
        writeln!(f, "}}")
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '$' => quoted.push_str("$$"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use ippool_core::{SubnetState, VirtualNetworkState};

    fn sample() -> EnvironmentState {
        let mut hub = VirtualNetworkState {
            address_space: "10.0.0.0/16".into(),
            ..Default::default()
        };
        hub.subnets.insert(
            "gateway".into(),
            SubnetState {
                address_space: "10.0.0.0/24".into(),
            },
        );
        let mut state = EnvironmentState {
            address_space: "10.0.0.0/8".into(),
            ..Default::default()
        };
        state.virtual_networks.insert("hub".into(), hub);
        state.virtual_networks.insert(
            "spoke".into(),
            VirtualNetworkState {
                address_space: "10.1.0.0/16".into(),
                ..Default::default()
            },
        );
        state
    }

    #[test]
    fn test_generates_nested_default() {
        let text = generate_terraform(&sample(), "ip_plan").unwrap();
        let expected_default = r#"  default = {
    "hub" = {
      address_space = "10.0.0.0/16"
      subnets = {
        "gateway" = {
          address_space = "10.0.0.0/24"
        }
      }
    }
    "spoke" = {
      address_space = "10.1.0.0/16"
      subnets = {}
    }
  }
}
"#;
        assert!(text.starts_with("# address space 10.0.0.0/8\nvariable \"ip_plan\" {\n"));
        assert!(text.ends_with(expected_default), "unexpected output:\n{text}");
    }

    #[test]
    fn test_empty_environment() {
        let state = EnvironmentState {
            address_space: "10.0.0.0/8".into(),
            ..Default::default()
        };
        let text = generate_terraform(&state, "plan").unwrap();
        assert!(text.ends_with("  default = {}\n}\n"));
    }

    #[test]
    fn test_rejects_bad_variable_names() {
        for name in ["", "1abc", "has space", "quote\""] {
            let err = generate_terraform(&sample(), name).unwrap_err();
            assert_eq!(err.to_string(), format!("invalid variable name: {name}"));
        }
    }

    #[test]
    fn test_keys_are_escaped() {
        assert_eq!(quote(r#"a"b\c${x}"#), r#""a\"b\\c$${x}""#);
    }
}
