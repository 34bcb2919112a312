pub mod gallery;
pub mod image;
pub mod users;

// Gallery entities
pub use gallery::{
    ActiveModel as GalleryActiveModel, Column as GalleryColumn, Entity as GalleryEntity,
    Model as GalleryModel, Relation as GalleryRelation,
};

// Image entities
pub use image::{
    ActiveModel as ImageActiveModel, Column as ImageColumn, Entity as ImageEntity,
    Model as ImageModel, Relation as ImageRelation,
};

// User entities
pub use users::{
    ActiveModel as UserActiveModel, Column as UserColumn, Entity as UserEntity,
    Model as UserModel, RoleEnum,
};
