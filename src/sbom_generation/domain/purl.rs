use std::fmt;

/// PackageUrl value object (`pkg:type/namespace/name@version`)
///
/// Only the coordinates used as the merge key are modelled; qualifiers and
/// subpaths are dropped when parsing an engine-provided purl. Every path
/// component is percent-encoded, so the rendered string is a pure function
/// of the four coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageUrl {
    package_type: String,
    namespace: Option<String>,
    name: String,
    version: String,
}

impl PackageUrl {
    pub fn new(package_type: &str, namespace: Option<&str>, name: &str, version: &str) -> Self {
        Self {
            package_type: package_type.to_ascii_lowercase(),
            namespace: namespace
                .map(|ns| ns.trim_matches('/'))
                .filter(|ns| !ns.is_empty())
                .map(String::from),
            name: name.to_string(),
            version: version.to_string(),
        }
    }

    /// Parses a purl string. Returns `None` if it is not a `pkg:` URL with
    /// at least a type and a name.
    pub fn parse(purl: &str) -> Option<Self> {
        let rest = purl.strip_prefix("pkg:")?.trim_start_matches('/');
        let rest = rest.split('#').next().unwrap_or_default();
        let rest = rest.split('?').next().unwrap_or_default();

        let (package_type, path) = rest.split_once('/')?;
        if package_type.is_empty() {
            return None;
        }

        let (path, version) = match path.rsplit_once('@') {
            // an '@' before the last '/' belongs to the namespace (npm scopes)
            Some((head, version)) if !version.contains('/') => (head, decode(version)),
            _ => (path, String::new()),
        };

        let path = path.trim_matches('/');
        let (namespace, name) = match path.rsplit_once('/') {
            Some((namespace, name)) => (Some(namespace), name),
            None => (None, path),
        };
        if name.is_empty() {
            return None;
        }

        let namespace = namespace.map(|ns| {
            ns.split('/')
                .filter(|segment| !segment.is_empty())
                .map(decode)
                .collect::<Vec<_>>()
                .join("/")
        });

        Some(Self::new(
            package_type,
            namespace.as_deref(),
            &decode(name),
            &version,
        ))
    }

    pub fn package_type(&self) -> &str {
        &self.package_type
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

impl fmt::Display for PackageUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pkg:{}/", self.package_type)?;
        if let Some(namespace) = &self.namespace {
            let encoded: Vec<_> = namespace
                .split('/')
                .map(|segment| urlencoding::encode(segment).into_owned())
                .collect();
            write!(f, "{}/", encoded.join("/"))?;
        }
        write!(f, "{}", urlencoding::encode(&self.name))?;
        if !self.version.is_empty() {
            write!(f, "@{}", urlencoding::encode(&self.version))?;
        }
        Ok(())
    }
}

fn decode(component: &str) -> String {
    urlencoding::decode(component)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| component.to_string())
}
