//! Datasource descriptors and connection string synthesis

use serde::Deserialize;

use crate::domain::DomainError;

/// SQLAlchemy-style URL scheme for each supported datasource type.
const SCHEMES: &[(&str, &str)] = &[
    ("postgres", "postgresql"),
    ("postgresql", "postgresql"),
    ("mysql", "mysql+pymysql"),
    ("mssql", "mssql+pyodbc"),
    ("sqlserver", "mssql+pyodbc"),
    ("redshift", "redshift+psycopg2"),
    ("snowflake", "snowflake"),
    ("oracle", "oracle+cx_oracle"),
];

/// Look up the URL scheme for a datasource type (case-insensitive).
pub fn scheme_for(kind: &str) -> Result<&'static str, DomainError> {
    let kind_lower = kind.to_ascii_lowercase();
    SCHEMES
        .iter()
        .find(|(k, _)| *k == kind_lower)
        .map(|(_, scheme)| *scheme)
        .ok_or_else(|| DomainError::UnsupportedDatasourceType(kind.to_string()))
}

/// Datasource connection definition as returned by the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatasourceDescriptor {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Local credential override, stored per datasource id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CredentialOverride {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl DatasourceDescriptor {
    /// Build `<scheme>://<user>:<password>@<host>:<port>/<database>`.
    ///
    /// Override fields replace the remote ones when present. User, password,
    /// port and database are omitted from the URL when unset; the host is required.
    pub fn connection_string(
        &self,
        credentials: Option<&CredentialOverride>,
    ) -> Result<String, DomainError> {
        let scheme = scheme_for(&self.kind)?;
        let host = self
            .host
            .as_deref()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| DomainError::IncompleteDatasource {
                id: self.id.clone(),
                field: "host",
            })?;

        let user = credentials
            .and_then(|c| c.user.as_deref())
            .or(self.user.as_deref());
        let password = credentials
            .and_then(|c| c.password.as_deref())
            .or(self.password.as_deref());

        let mut url = format!("{scheme}://");
        if let Some(user) = user {
            url.push_str(user);
            if let Some(password) = password {
                url.push(':');
                url.push_str(password);
            }
            url.push('@');
        }
        url.push_str(host);
        if let Some(port) = self.port {
            url.push_str(&format!(":{port}"));
        }
        if let Some(database) = self.database.as_deref() {
            url.push('/');
            url.push_str(database);
        }
        Ok(url)
    }
}
