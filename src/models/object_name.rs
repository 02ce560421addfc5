use std::fmt;
use std::str::FromStr;

use crate::error::ProbeError;

/// 管理对象名：`domain:key=value[,key=value]*`
///
/// 值可以用双引号包裹，引号内允许出现 `,` `=` `:`，转义符为 `\`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectName {
    canonical: String,
    domain: String,
    properties: Vec<(String, String)>,
}

impl ObjectName {
    #[cfg(test)]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    #[cfg(test)]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn as_str(&self) -> &str {
        &self.canonical
    }
}

impl FromStr for ObjectName {
    type Err = ProbeError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ProbeError::object_name_invalid(name, reason);

        let (domain, key_list) = name
            .split_once(':')
            .ok_or_else(|| invalid("missing ':' after domain"))?;
        if domain.is_empty() {
            return Err(invalid("empty domain"));
        }
        if domain.contains(['\n', '=', ',']) {
            return Err(invalid("domain contains an illegal character"));
        }
        if key_list.is_empty() {
            return Err(invalid("no key properties"));
        }

        let mut properties: Vec<(String, String)> = Vec::new();
        let mut chars = key_list.chars().peekable();

        loop {
            let mut key = String::new();
            while let Some(&c) = chars.peek() {
                if c == '=' {
                    break;
                }
                if matches!(c, ',' | ':' | '*' | '?' | '\n') {
                    return Err(invalid(&format!("illegal character '{}' in key", c)));
                }
                key.push(c);
                chars.next();
            }
            if chars.next() != Some('=') {
                return Err(invalid(&format!("key '{}' has no value", key)));
            }
            if key.is_empty() {
                return Err(invalid("empty key"));
            }

            let mut value = String::new();
            if chars.peek() == Some(&'"') {
                value.push('"');
                chars.next();
                let mut closed = false;
                while let Some(c) = chars.next() {
                    value.push(c);
                    match c {
                        '\\' => match chars.next() {
                            Some(escaped @ ('"' | '\\' | '*' | '?' | 'n')) => value.push(escaped),
                            _ => return Err(invalid("bad escape in quoted value")),
                        },
                        '"' => {
                            closed = true;
                            break;
                        }
                        '\n' => return Err(invalid("newline in quoted value")),
                        _ => {}
                    }
                }
                if !closed {
                    return Err(invalid("unterminated quoted value"));
                }
            } else {
                while let Some(&c) = chars.peek() {
                    if c == ',' {
                        break;
                    }
                    if matches!(c, '=' | ':' | '"' | '*' | '?' | '\n') {
                        return Err(invalid(&format!("illegal character '{}' in value", c)));
                    }
                    value.push(c);
                    chars.next();
                }
                if value.is_empty() {
                    return Err(invalid(&format!("empty value for key '{}'", key)));
                }
            }

            if properties.iter().any(|(k, _)| *k == key) {
                return Err(invalid(&format!("duplicate key '{}'", key)));
            }
            properties.push((key, value));

            match chars.next() {
                None => break,
                Some(',') => continue,
                Some(c) => return Err(invalid(&format!("unexpected '{}' after value", c))),
            }
        }

        Ok(Self {
            canonical: name.to_string(),
            domain: domain.to_string(),
            properties,
        })
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.domain)?;
        for (i, (key, value)) in self.properties.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        Ok(())
    }
}
