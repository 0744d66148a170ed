/// Reachability supervisor and connectivity transitions.
pub mod connectivity_service;
/// Presentation event fan-out and SSE streaming.
pub mod event_service;
/// Health check service.
pub mod health_service;
/// Player mutations with remote-first, local-fallback policy.
pub mod player_service;
/// Remote reconciliation and the periodic poll.
pub mod sync_service;
