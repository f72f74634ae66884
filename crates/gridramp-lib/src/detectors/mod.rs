pub mod edac;
