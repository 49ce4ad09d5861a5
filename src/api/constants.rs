//! API Constants for the vtiger web-service endpoint

/// Default script the web-service API is served from, relative to the CRM base URL
pub const DEFAULT_WEBSERVICE_PATH: &str = "webservice.php";

/// Default request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// User agent sent with every request
pub const USER_AGENT: &str = "vtiger-cli/0.1";

/// Operation names understood by the web-service endpoint
pub mod operations {
    pub const GET_CHALLENGE: &str = "getchallenge";
    pub const LOGIN: &str = "login";
    pub const LOGIN_PASSWORD: &str = "login_pwd";
    pub const QUERY: &str = "query";
    pub const RETRIEVE: &str = "retrieve";
    pub const CREATE: &str = "create";
    pub const UPDATE: &str = "update";
    pub const DELETE: &str = "delete";
    pub const DESCRIBE: &str = "describe";
    pub const LIST_TYPES: &str = "listtypes";
    pub const SYNC: &str = "sync";
}

/// Payload keys shared across operations
pub mod fields {
    pub const OPERATION: &str = "operation";
    pub const SESSION_NAME: &str = "sessionName";
    pub const USERNAME: &str = "username";
    pub const ACCESS_KEY: &str = "accessKey";
    pub const PASSWORD: &str = "password";
    pub const QUERY: &str = "query";
    pub const ID: &str = "id";
    pub const ELEMENT_TYPE: &str = "elementType";
    pub const ELEMENT: &str = "element";
    pub const MODIFIED_TIME: &str = "modifiedTime";
    pub const ASSIGNED_USER_ID: &str = "assigned_user_id";
}

/// Payload keys whose values never reach the logs
pub const SENSITIVE_FIELDS: &[&str] = &[fields::ACCESS_KEY, fields::PASSWORD];

/// Build the full web-service endpoint URL
pub fn webservice_endpoint(base_url: &str, webservice_path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        webservice_path.trim_start_matches('/')
    )
}
