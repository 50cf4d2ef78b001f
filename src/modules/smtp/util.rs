use crate::{generate_token, utc_now};

/// Message id for outbound mail, unique per send. Stored and passed to the
/// builder without angle brackets; the wire format adds them.
pub fn generate_message_id(sender_domain: &str) -> String {
    let token = generate_token!(96).to_lowercase();
    let timestamp_millis = utc_now!();
    format!("{}.{}@{}", timestamp_millis, token, sender_domain)
}

#[cfg(test)]
mod test {
    use crate::modules::smtp::util::generate_message_id;

    #[test]
    fn ids_are_domain_scoped_and_unique() {
        let a = generate_message_id("shop.example");
        let b = generate_message_id("shop.example");
        assert!(a.ends_with("@shop.example"));
        assert_ne!(a, b);
    }
}
