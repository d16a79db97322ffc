//! Built-in policy names and canonical source.

/// Synthetic policy granting every capability on every path.
pub const ROOT_POLICY_NAME: &str = "root";

/// Attached to every token unless explicitly excluded.
pub const DEFAULT_POLICY_NAME: &str = "default";

/// Lets a response-wrapping token read its cubbyhole and unwrap.
pub const RESPONSE_WRAPPING_POLICY_NAME: &str = "response-wrapping";

/// Cannot be written or deleted through the public store API.
pub const IMMUTABLE_POLICIES: &[&str] = &[ROOT_POLICY_NAME, RESPONSE_WRAPPING_POLICY_NAME];

/// Resolvable, but never offered when picking policies for a credential.
pub const NON_ASSIGNABLE_POLICIES: &[&str] = &[RESPONSE_WRAPPING_POLICY_NAME];

pub fn is_immutable(name: &str) -> bool {
    IMMUTABLE_POLICIES.contains(&name)
}

pub fn is_assignable(name: &str) -> bool {
    !NON_ASSIGNABLE_POLICIES.contains(&name)
}

pub const RESPONSE_WRAPPING_POLICY: &str = r#"
path "cubbyhole/response" {
    capabilities = ["create", "read"]
}

path "sys/wrapping/unwrap" {
    capabilities = ["update"]
}
"#;

pub const DEFAULT_POLICY: &str = r#"
# Allow tokens to look up their own properties
path "auth/token/lookup-self" {
    capabilities = ["read"]
}

# Allow tokens to renew themselves
path "auth/token/renew-self" {
    capabilities = ["update"]
}

# Allow tokens to revoke themselves
path "auth/token/revoke-self" {
    capabilities = ["update"]
}

# Allow a token to look up its own capabilities on a path
path "sys/capabilities-self" {
    capabilities = ["update"]
}

# Allow a token to renew a lease via lease_id in the request body; old path for
# old clients, new path for newer
path "sys/renew" {
    capabilities = ["update"]
}
path "sys/leases/renew" {
    capabilities = ["update"]
}

# Allow looking up lease properties. This requires knowing the lease ID ahead
# of time and does not divulge any sensitive information.
path "sys/leases/lookup" {
    capabilities = ["update"]
}

# Allow a token to manage its own cubbyhole
path "cubbyhole/*" {
    capabilities = ["create", "read", "update", "delete", "list"]
}

# Allow a token to wrap arbitrary values in a response-wrapping token
path "sys/wrapping/wrap" {
    capabilities = ["update"]
}

# Allow a token to look up the creation time and TTL of a given
# response-wrapping token
path "sys/wrapping/lookup" {
    capabilities = ["update"]
}

# Allow a token to unwrap a response-wrapping token. This is a convenience to
# avoid client token swapping since this is also part of the response wrapping
# policy.
path "sys/wrapping/unwrap" {
    capabilities = ["update"]
}

# Allow general purpose tools
path "sys/tools/hash" {
    capabilities = ["update"]
}
path "sys/tools/hash/*" {
    capabilities = ["update"]
}
path "sys/tools/random" {
    capabilities = ["update"]
}
path "sys/tools/random/*" {
    capabilities = ["update"]
}
"#;
