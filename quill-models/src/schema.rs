table! {
    api_tokens (id) {
        id -> Int4,
        creation_date -> Timestamp,
        value -> Text,
        user_id -> Int4,
    }
}

table! {
    asks (id) {
        id -> Int4,
        sender_id -> Nullable<Int4>,
        receiver_id -> Int4,
        question -> Text,
        answer -> Nullable<Text>,
        creation_date -> Timestamp,
    }
}

table! {
    blocks (id) {
        id -> Int4,
        blog_id -> Int4,
        blocked_id -> Int4,
        creation_date -> Timestamp,
    }
}

table! {
    blog_settings (id) {
        id -> Int4,
        blog_id -> Int4,
        avatar -> Text,
        avatar_shape -> Varchar,
        description -> Text,
        replies -> Varchar,
    }
}

table! {
    blog_users (id) {
        id -> Int4,
        user_id -> Int4,
        blog_id -> Int4,
        is_primary -> Bool,
        full_privileges -> Bool,
        contributor_privileges -> Bool,
    }
}

table! {
    blogs (id) {
        id -> Int4,
        blog_name -> Varchar,
        title -> Varchar,
        privacy -> Varchar,
        password -> Nullable<Varchar>,
        creation_date -> Timestamp,
    }
}

table! {
    email_verifications (id) {
        id -> Int4,
        user_id -> Int4,
        token -> Varchar,
        expiration_date -> Timestamp,
    }
}

table! {
    follows (id) {
        id -> Int4,
        user_id -> Int4,
        blog_id -> Int4,
        creation_date -> Timestamp,
    }
}

table! {
    messages (id) {
        id -> Int4,
        sender_id -> Int4,
        receiver_id -> Int4,
        content -> Text,
        read -> Bool,
        creation_date -> Timestamp,
    }
}

table! {
    notifications (id) {
        id -> Int4,
        user_id -> Int4,
        creation_date -> Timestamp,
        kind -> Varchar,
        object_id -> Int4,
    }
}

table! {
    password_reset_requests (id) {
        id -> Int4,
        email -> Varchar,
        token -> Varchar,
        expiration_date -> Timestamp,
    }
}

table! {
    post_notes (id) {
        id -> Int4,
        user_id -> Int4,
        post_id -> Int4,
        kind -> Varchar,
        content -> Nullable<Text>,
        creation_date -> Timestamp,
    }
}

table! {
    post_tags (id) {
        id -> Int4,
        post_id -> Int4,
        tag_id -> Int4,
        position -> Int4,
    }
}

table! {
    posts (id) {
        id -> Int4,
        blog_id -> Int4,
        kind -> Varchar,
        state -> Varchar,
        content -> Text,
        source_content -> Nullable<Text>,
        creation_date -> Timestamp,
    }
}

table! {
    submissions (id) {
        id -> Int4,
        sender_id -> Int4,
        receiver_id -> Int4,
        content -> Text,
        kind -> Varchar,
        creation_date -> Timestamp,
    }
}

table! {
    tags (id) {
        id -> Int4,
        name -> Varchar,
    }
}

table! {
    users (id) {
        id -> Int4,
        email -> Varchar,
        hashed_password -> Nullable<Text>,
        email_verified -> Bool,
        theme -> Varchar,
        creation_date -> Timestamp,
    }
}

joinable!(api_tokens -> users (user_id));
joinable!(asks -> blogs (receiver_id));
joinable!(blog_settings -> blogs (blog_id));
joinable!(blog_users -> blogs (blog_id));
joinable!(blog_users -> users (user_id));
joinable!(email_verifications -> users (user_id));
joinable!(follows -> blogs (blog_id));
joinable!(follows -> users (user_id));
joinable!(notifications -> users (user_id));
joinable!(post_notes -> posts (post_id));
joinable!(post_notes -> users (user_id));
joinable!(post_tags -> posts (post_id));
joinable!(post_tags -> tags (tag_id));
joinable!(posts -> blogs (blog_id));

allow_tables_to_appear_in_same_query!(
    api_tokens,
    asks,
    blocks,
    blog_settings,
    blog_users,
    blogs,
    email_verifications,
    follows,
    messages,
    notifications,
    password_reset_requests,
    post_notes,
    post_tags,
    posts,
    submissions,
    tags,
    users,
);
