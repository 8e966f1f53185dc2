pub mod cache_evictor;
