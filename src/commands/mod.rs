/*!
Command handlers for the CLI

This module provides the handlers invoked by the CLI entrypoint:

- `serve` runs the MCP server on stdin/stdout
- `auth`  drives the OAuth2 authorization code flow and token housekeeping

The handlers print operator-facing text to stdout; diagnostics go through
`tracing` to stderr.
*/

pub mod auth;
pub mod serve;
