//! Named API endpoints.

use super::ApiRequest;

impl ApiRequest {
    /// `GET /v1/me`: the profile of the token's owner.
    ///
    /// # Examples
    ///
    /// ```
    /// use feedkit::request::ApiRequest;
    ///
    /// let request = ApiRequest::profile("tok");
    /// assert_eq!(request.path(), "/v1/me");
    /// ```
    pub fn profile(access_token: impl Into<String>) -> Self {
        Self::new("/v1/me", access_token)
    }

    /// `GET /v1/users/{user_id}/publications`: publications the user can
    /// access. The id is percent-encoded as a single path segment.
    ///
    /// # Examples
    ///
    /// ```
    /// use feedkit::request::ApiRequest;
    ///
    /// let request = ApiRequest::publications("u1", "tok");
    /// assert_eq!(request.path(), "/v1/users/u1/publications");
    /// ```
    pub fn publications(user_id: &str, access_token: impl Into<String>) -> Self {
        Self::new(
            format!("/v1/users/{}/publications", urlencoding::encode(user_id)),
            access_token,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_endpoint() {
        let http = ApiRequest::profile("abc").build().unwrap();
        assert_eq!(http.url.as_str(), "https://api.medium.com/v1/me");
        assert_eq!(http.headers["authorization"], "Bearer abc");
    }

    #[test]
    fn publications_endpoint_escapes_user_id() {
        let request = ApiRequest::publications("a/b c", "t");
        assert_eq!(request.path(), "/v1/users/a%2Fb%20c/publications");

        let http = request.build().unwrap();
        assert_eq!(http.url.path(), "/v1/users/a%2Fb%20c/publications");
    }
}
