use uuid::Uuid;

/// Token shared by every event published for one logical operation.
pub fn new_operation_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Server-assigned id for a freshly accepted socket.
pub fn new_socket_id() -> String {
    format!("{}.{}", std::process::id(), Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_ne!(new_operation_id(), new_operation_id());
        assert_ne!(new_socket_id(), new_socket_id());
    }
}
