use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Security scheme configuration for OpenAPI
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        // Get or create components section
        let components = openapi.components.get_or_insert_with(Default::default);

        // Add bearer token security scheme
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

/// API documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Social Network Backend API",
        version = "0.1.0",
        description = "REST API for the Social Network Backend"
    ),
    paths(
        // Health check endpoints
        crate::routes::health::health_check,
        crate::routes::health::protected_health_check,
        // Authentication endpoints
        crate::auth::controller::register,
        crate::auth::controller::login,
        crate::auth::controller::logout,
        // User endpoints
        crate::user::controller::get_profile,
        crate::user::controller::update_profile,
        crate::user::controller::list_users,
        // Post endpoints
        crate::post::controller::create_post,
        crate::post::controller::list_posts,
        crate::post::controller::get_post,
        crate::post::controller::timeline,
        crate::post::controller::my_posts,
        crate::post::controller::update_post,
        crate::post::controller::delete_post,
        // Comment endpoints
        crate::comment::controller::create_comment,
        crate::comment::controller::get_post_comments,
        crate::comment::controller::get_replies,
        crate::comment::controller::update_comment,
        crate::comment::controller::delete_comment,
        // Friendship endpoints
        crate::friendship::controller::send_request,
        crate::friendship::controller::respond,
        crate::friendship::controller::friends,
        crate::friendship::controller::received_requests,
        crate::friendship::controller::sent_requests,
        crate::friendship::controller::mutual_friends,
        crate::friendship::controller::suggestions,
        crate::friendship::controller::unfriend,
        crate::friendship::controller::block,
        crate::friendship::controller::unblock,
        // Reaction endpoints
        crate::reaction::controller::toggle_reaction,
        crate::reaction::controller::get_likes,
        crate::reaction::controller::check_reaction,
        // Notification endpoints
        crate::notification::controller::list_notifications,
        crate::notification::controller::notification_counts,
        crate::notification::controller::get_notification,
        crate::notification::controller::mark_read,
        crate::notification::controller::mark_seen,
        crate::notification::controller::mark_all_read,
        crate::notification::controller::mark_all_seen,
        crate::notification::controller::get_preferences,
        crate::notification::controller::update_preferences
    ),
    components(
        schemas(
            // Shared wrappers
            crate::schema_ext::DateTimeWrapper,
            crate::schema_ext::UuidWrapper,
            // Auth schemas
            crate::auth::controller::RegisterRequest,
            crate::auth::controller::LoginRequest,
            crate::auth::controller::TokenPairResponse,
            crate::auth::controller::AuthResponse,
            crate::auth::controller::LogoutResponse,
            crate::auth::controller::ErrorResponse,
            // User schemas
            crate::user::model::ProfileResponse,
            crate::user::model::UpdateProfileRequest,
            crate::user::model::UserBrief,
            crate::user::model::UserListResponse,
            crate::user::model::UserErrorResponse,
            // Post schemas
            crate::post::model::CreatePostRequest,
            crate::post::model::UpdatePostRequest,
            crate::post::model::PostResponse,
            crate::post::model::PostsListResponse,
            crate::post::model::PostErrorResponse,
            // Comment schemas
            crate::comment::model::CreateCommentRequest,
            crate::comment::model::UpdateCommentRequest,
            crate::comment::model::CommentResponse,
            crate::comment::model::CommentsListResponse,
            crate::comment::model::CommentErrorResponse,
            // Friendship schemas
            crate::friendship::model::SendFriendRequestRequest,
            crate::friendship::model::RespondToRequestRequest,
            crate::friendship::model::FriendshipResponse,
            crate::friendship::model::FriendListResponse,
            crate::friendship::model::FriendRequestListResponse,
            crate::friendship::model::SuggestionsResponse,
            crate::friendship::model::FriendshipErrorResponse,
            crate::friendship::controller::FriendActionResponse,
            // Reaction schemas
            crate::reaction::model::ToggleReactionRequest,
            crate::reaction::model::ToggleReactionResponse,
            crate::reaction::model::ReactionEntry,
            crate::reaction::model::LikesResponse,
            crate::reaction::model::CheckReactionResponse,
            crate::reaction::model::ReactionErrorResponse,
            // Notification schemas
            crate::notification::model::NotificationResponse,
            crate::notification::model::NotificationListResponse,
            crate::notification::model::NotificationCountsResponse,
            crate::notification::model::MarkAllResponse,
            crate::notification::model::NotificationPreference,
            crate::notification::model::UpdatePreferencesRequest,
            crate::notification::model::NotificationErrorResponse,
            crate::notification::controller::FlagResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Service health"),
        (name = "authentication", description = "Account registration and sessions"),
        (name = "users", description = "User profiles and directory"),
        (name = "posts", description = "Posts and timelines"),
        (name = "comments", description = "Comments and replies"),
        (name = "friends", description = "Friendship graph"),
        (name = "reactions", description = "Reactions on posts and comments"),
        (name = "notifications", description = "Stored notifications and preferences")
    )
)]
pub struct ApiDoc;
