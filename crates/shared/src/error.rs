use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsernameError {
    #[error("username must not be blank")]
    Empty,
    #[error("username is {actual} characters long, the limit is {max}")]
    TooLong { max: usize, actual: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockDecodeError {
    #[error("block {0} has an owner but no color")]
    OwnerWithoutColor(i64),
    #[error("block {0} has a color but no owner")]
    ColorWithoutOwner(i64),
}
