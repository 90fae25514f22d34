/*
 * Responsibility
 * - Public entry points of the HTTP layers
 * - http (request id, trace, limits), cors, security headers, auth gates
 */
pub mod auth;
pub mod cors;
pub mod http;
pub mod security_headers;
