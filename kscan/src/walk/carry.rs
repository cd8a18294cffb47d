/// Holds the last value a walker resolved for one field.
///
/// When enabled, a failed read is answered with that value instead of
/// "not available". This reproduces how scratch fields used to leak from
/// one record into the next, so it is off unless asked for.
#[derive(Debug, Clone)]
pub struct Carry<T> {
    enabled: bool,
    last: Option<T>,
}

impl<T: Copy> Carry<T> {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            last: None,
        }
    }

    pub fn resolve(&mut self, read: Option<T>) -> Option<T> {
        match read {
            Some(v) => {
                self.last = Some(v);
                Some(v)
            }
            None if self.enabled => self.last,
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_never_reuses() {
        let mut carry = Carry::new(false);
        assert_eq!(carry.resolve(Some(7u32)), Some(7));
        assert_eq!(carry.resolve(None), None);
    }

    #[test]
    fn enabled_reuses_last_good_value() {
        let mut carry = Carry::new(true);
        assert_eq!(carry.resolve(None::<u32>), None);
        assert_eq!(carry.resolve(Some(7)), Some(7));
        assert_eq!(carry.resolve(None), Some(7));
        assert_eq!(carry.resolve(Some(9)), Some(9));
        assert_eq!(carry.resolve(None), Some(9));
    }
}
