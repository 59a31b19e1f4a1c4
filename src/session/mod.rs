mod bag;
mod session;

pub use bag::{
    targeting_bags, AttributeBag, SessionBagDescriptor, TARGETING_BAG_SESSION,
    TARGETING_BAG_VISITOR,
};
pub use session::{Session, DEFAULT_COOKIE_NAME};
