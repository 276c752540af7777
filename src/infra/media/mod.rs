pub mod cloudinary_store;
