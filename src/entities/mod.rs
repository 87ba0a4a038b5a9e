//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod blog_post;
pub mod cart_item;
pub mod comment;
pub mod contact_message;
pub mod coupon;
pub mod course;
pub mod course_module;
pub mod enrollment;
pub mod lesson;
pub mod order;
pub mod order_item;
pub mod progress;
pub mod user;
pub mod wishlist_item;

// Re-export specific types to avoid conflicts
pub use blog_post::{Column as BlogPostColumn, Entity as BlogPost, Model as BlogPostModel};
pub use cart_item::{Column as CartItemColumn, Entity as CartItem, Model as CartItemModel};
pub use comment::{Column as CommentColumn, Entity as Comment, Model as CommentModel};
pub use contact_message::{
    Column as ContactMessageColumn, Entity as ContactMessage, Model as ContactMessageModel,
};
pub use coupon::{Column as CouponColumn, Entity as Coupon, Model as CouponModel};
pub use course::{Column as CourseColumn, Entity as Course, Model as CourseModel};
pub use course_module::{
    Column as CourseModuleColumn, Entity as CourseModule, Model as CourseModuleModel,
};
pub use enrollment::{Column as EnrollmentColumn, Entity as Enrollment, Model as EnrollmentModel};
pub use lesson::{Column as LessonColumn, Entity as Lesson, Model as LessonModel};
pub use order::{Column as OrderColumn, Entity as Order, Model as OrderModel};
pub use order_item::{Column as OrderItemColumn, Entity as OrderItem, Model as OrderItemModel};
pub use progress::{Column as ProgressColumn, Entity as Progress, Model as ProgressModel};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
pub use wishlist_item::{
    Column as WishlistItemColumn, Entity as WishlistItem, Model as WishlistItemModel,
};
