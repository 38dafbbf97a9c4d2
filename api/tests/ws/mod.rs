mod handshake_test;
